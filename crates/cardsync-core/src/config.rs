use crate::error::Result;
use crate::fetch::{self, DEFAULT_API_KEY_HEADER, DEFAULT_SOURCE_URL, KEY_PLACEHOLDER};
use crate::paths::{self, DEFAULT_DATA_DIR, DEFAULT_EXTENSION};
use crate::retry::RetryPolicy;
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// SourceConfig
// ---------------------------------------------------------------------------

/// Where records are fetched from. The API key itself never lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
}

fn default_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_api_key_header() -> String {
    DEFAULT_API_KEY_HEADER.to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            api_key_header: default_api_key_header(),
        }
    }
}

// ---------------------------------------------------------------------------
// RetryConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    2_000
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            delay: Duration::from_millis(self.delay_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Record directory, relative to the project root unless absolute.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Delay between records during `refresh-all`.
    #[serde(default = "default_pace_ms")]
    pub pace_ms: u64,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

fn default_pace_ms() -> u64 {
    1_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            extension: default_extension(),
            pace_ms: default_pace_ms(),
            source: SourceConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Load `cardsync.yaml` from `root`. A missing file means all defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn data_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.data_dir)
    }

    pub fn store(&self, root: &Path) -> RecordStore {
        RecordStore::new(self.data_dir(root), self.extension.as_str())
    }

    pub fn pace(&self) -> Duration {
        Duration::from_millis(self.pace_ms)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut push = |level, message: String| warnings.push(ConfigWarning { level, message });

        if !self.source.url.contains(KEY_PLACEHOLDER) {
            push(
                WarnLevel::Error,
                format!(
                    "source.url '{}' has no {KEY_PLACEHOLDER} placeholder",
                    self.source.url
                ),
            );
        } else if !fetch::is_valid_template(&self.source.url) {
            push(
                WarnLevel::Error,
                format!("source.url '{}' must be http:// or https://", self.source.url),
            );
        }

        if self.source.api_key_header.trim().is_empty() {
            push(
                WarnLevel::Warning,
                "source.api_key_header is empty; the API key will not be sent".to_string(),
            );
        }

        if self.extension.trim_start_matches('.').is_empty() {
            push(WarnLevel::Error, "extension must not be empty".to_string());
        }

        if self.retry.max_attempts == 0 {
            push(
                WarnLevel::Warning,
                "retry.max_attempts is 0; each fetch is still attempted once".to_string(),
            );
        } else if self.retry.max_attempts > 10 {
            push(
                WarnLevel::Warning,
                format!(
                    "retry.max_attempts={} (>10 is unusual)",
                    self.retry.max_attempts
                ),
            );
        }

        if self.retry.timeout_secs == 0 {
            push(
                WarnLevel::Error,
                "retry.timeout_secs must be greater than 0".to_string(),
            );
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
