use crate::error::{Result, SyncError};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "cardsync.yaml";
pub const DEFAULT_DATA_DIR: &str = "card_set_lookup";
pub const DEFAULT_EXTENSION: &str = "json";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// RecordKey
// ---------------------------------------------------------------------------

static KEY_RE: OnceLock<Regex> = OnceLock::new();

fn key_re() -> &'static Regex {
    KEY_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._\-]*$").unwrap())
}

/// Identifier of a stored record, e.g. the set id `base1`.
///
/// Keys end up in both a file name and a request URL, so only a small
/// character set is accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    /// Accept `key` exactly as given.
    pub fn new(key: &str) -> Result<Self> {
        if key.is_empty() || key.len() > 64 || key.contains("..") || !key_re().is_match(key) {
            return Err(SyncError::InvalidKey(key.to_string()));
        }
        Ok(Self(key.to_string()))
    }

    /// Parse a key typed by a user. Surrounding whitespace is dropped.
    pub fn parse_input(input: &str) -> Result<Self> {
        Self::new(input.trim())
    }

    /// Derive the key from a record file name by stripping `.{ext}`.
    /// Returns `None` for names that are not records.
    pub fn from_file_name(name: &str, ext: &str) -> Option<Self> {
        let stem = name.strip_suffix(ext)?.strip_suffix('.')?;
        Self::new(stem).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self, ext: &str) -> String {
        format!("{}.{ext}", self.0)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
