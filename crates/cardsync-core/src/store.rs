use crate::error::{Result, SyncError};
use crate::io;
use crate::paths::RecordKey;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A flat directory of `<key>.<ext>` record files.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
    ext: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordInfo {
    pub key: RecordKey,
    pub path: PathBuf,
    pub bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>, ext: impl Into<String>) -> Self {
        let ext = ext.into();
        Self {
            dir: dir.into(),
            ext: ext.trim_start_matches('.').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the record directory if it does not exist yet.
    pub fn ensure(&self) -> Result<()> {
        io::ensure_dir(&self.dir).map_err(|source| SyncError::Enumerate {
            dir: self.dir.clone(),
            source,
        })
    }

    pub fn path(&self, key: &RecordKey) -> PathBuf {
        self.dir.join(key.file_name(&self.ext))
    }

    pub fn exists(&self, key: &RecordKey) -> bool {
        self.path(key).is_file()
    }

    /// Keys of every record currently on disk, sorted by file name.
    ///
    /// Hidden files, subdirectories, other extensions and names that are not
    /// valid keys are skipped.
    pub fn keys(&self) -> Result<Vec<RecordKey>> {
        let enumerate_err = |source| SyncError::Enumerate {
            dir: self.dir.clone(),
            source,
        };

        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(enumerate_err)? {
            let entry = entry.map_err(enumerate_err)?;
            if !entry.file_type().map_err(enumerate_err)?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                tracing::debug!(name = ?entry.file_name(), "skipping non-UTF-8 file name");
                continue;
            };
            if let Some(key) = RecordKey::from_file_name(name, &self.ext) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Size and modification time of every record, in [`keys`](Self::keys) order.
    pub fn entries(&self) -> Result<Vec<RecordInfo>> {
        self.keys()?
            .into_iter()
            .map(|key| -> Result<RecordInfo> {
                let path = self.path(&key);
                let meta = std::fs::metadata(&path)?;
                Ok(RecordInfo {
                    bytes: meta.len(),
                    modified: meta.modified().ok().map(DateTime::<Utc>::from),
                    key,
                    path,
                })
            })
            .collect()
    }

    /// Replace the record's content. The file is either left as it was or
    /// holds exactly `data`.
    pub fn write(&self, key: &RecordKey, data: &[u8]) -> Result<PathBuf> {
        let path = self.path(key);
        io::atomic_write(&path, data).map_err(|source| SyncError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
