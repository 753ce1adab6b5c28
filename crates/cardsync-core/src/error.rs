use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid record key '{0}': use 1-64 letters, digits, '.', '_' or '-', starting with a letter or digit")]
    InvalidKey(String),

    #[error("cannot list records in {}: {source}", dir.display())]
    Enumerate {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("fetch failed for '{key}': {source}")]
    Fetch {
        key: String,
        #[source]
        source: FetchError,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Failure of a single fetch attempt against the remote source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("remote returned HTTP {status}")]
    Status { status: u16 },

    #[error("invalid source URL '{0}'")]
    InvalidUrl(String),
}

impl FetchError {
    /// Transient failures worth another attempt: timeouts, connection
    /// problems, 408, 429 and 5xx. Any other status fails fast.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout(_) | FetchError::Network(_) => true,
            FetchError::Status { status } => {
                *status == 408 || *status == 429 || (500..600).contains(status)
            }
            FetchError::InvalidUrl(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
