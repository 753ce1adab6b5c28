use crate::error::FetchError;
use crate::paths::RecordKey;
use reqwest::blocking::Client;
use std::time::Duration;

pub const DEFAULT_SOURCE_URL: &str = "https://api.pokemontcg.io/v2/cards?q=set.id:{key}";
pub const DEFAULT_API_KEY_HEADER: &str = "X-Api-Key";

/// Placeholder replaced by the record key in a source URL template.
pub const KEY_PLACEHOLDER: &str = "{key}";

/// Retrieves the latest content of a record from wherever records come from.
///
/// Payloads are opaque bytes; nothing in the fetch path parses them.
pub trait Fetcher {
    fn fetch(&self, key: &RecordKey) -> Result<Vec<u8>, FetchError>;
}

impl<F> Fetcher for F
where
    F: Fn(&RecordKey) -> Result<Vec<u8>, FetchError>,
{
    fn fetch(&self, key: &RecordKey) -> Result<Vec<u8>, FetchError> {
        self(key)
    }
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// GETs `url_template` with `{key}` substituted.
///
/// The API key, when there is one, is supplied by the caller. Nothing here
/// reads the environment.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    url_template: String,
    timeout: Duration,
    api_key: Option<(String, String)>,
}

impl HttpFetcher {
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let url_template = url_template.into();
        if !is_valid_template(&url_template) {
            return Err(FetchError::InvalidUrl(url_template));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cardsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url_template,
            timeout,
            api_key: None,
        })
    }

    /// Send `value` in `header` on every request. A `None` or blank value,
    /// or a blank header name, leaves requests unauthenticated.
    pub fn with_api_key(mut self, header: impl Into<String>, value: Option<String>) -> Self {
        let header = header.into();
        let has_header = !header.trim().is_empty();
        self.api_key = value
            .filter(|v| has_header && !v.trim().is_empty())
            .map(|v| (header, v));
        self
    }

    pub fn url_for(&self, key: &RecordKey) -> String {
        self.url_template.replace(KEY_PLACEHOLDER, key.as_str())
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(error_chain(&err))
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, key: &RecordKey) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(key);
        tracing::debug!(key = %key, url = %url, "fetching record");

        let mut req = self.client.get(&url);
        if let Some((header, value)) = &self.api_key {
            req = req.header(header.as_str(), value.as_str());
        }

        let resp = req.send().map_err(|e| self.classify(e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        let body = resp.bytes().map_err(|e| self.classify(e))?;
        Ok(body.to_vec())
    }
}

pub fn is_valid_template(url: &str) -> bool {
    (url.starts_with("http://") || url.starts_with("https://")) && url.contains(KEY_PLACEHOLDER)
}

/// reqwest's top-level message omits the cause ("error sending request");
/// append the source chain so warnings say what actually went wrong.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
