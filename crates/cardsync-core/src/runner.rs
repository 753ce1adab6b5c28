//! Batch refresh of every stored record, and the single-record fetch that
//! shares its fetch/retry/write path.

use crate::error::{FetchError, Result, SyncError};
use crate::fetch::Fetcher;
use crate::paths::RecordKey;
use crate::retry::{retry_when, RetryPolicy};
use crate::store::RecordStore;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// BatchReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchOutcome {
    AllSucceeded,
    PartialFailure,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedRecord {
    pub key: RecordKey,
    pub reason: String,
}

/// What a `refresh_all` run did. Built fresh per run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub dir: PathBuf,
    pub total: usize,
    pub refreshed: Vec<RecordKey>,
    pub failed: Vec<FailedRecord>,
    pub outcome: BatchOutcome,
}

impl BatchReport {
    fn new(dir: PathBuf, total: usize) -> Self {
        Self {
            dir,
            total,
            refreshed: Vec::new(),
            failed: Vec::new(),
            outcome: BatchOutcome::AllSucceeded,
        }
    }

    fn record_failure(&mut self, key: RecordKey, err: &SyncError) {
        let reason = match err {
            SyncError::Fetch { source, .. } => source.to_string(),
            other => other.to_string(),
        };
        self.failed.push(FailedRecord { key, reason });
        self.outcome = BatchOutcome::PartialFailure;
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// One-line human summary of the run.
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return format!("Nothing to refresh: no records in {}", self.dir.display());
        }
        match self.outcome {
            BatchOutcome::AllSucceeded => format!(
                "Refresh complete: {}/{} records refreshed.",
                self.refreshed.len(),
                self.total
            ),
            BatchOutcome::PartialFailure => {
                let keys: Vec<&str> = self.failed.iter().map(|f| f.key.as_str()).collect();
                format!(
                    "Refresh complete with failures: {}/{} records refreshed; kept existing data for {}.",
                    self.refreshed.len(),
                    self.total,
                    keys.join(", ")
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

pub struct Runner<F> {
    store: RecordStore,
    fetcher: F,
    policy: RetryPolicy,
    pace: Duration,
}

impl<F: Fetcher> Runner<F> {
    pub fn new(store: RecordStore, fetcher: F, policy: RetryPolicy) -> Self {
        Self {
            store,
            fetcher,
            policy,
            pace: Duration::ZERO,
        }
    }

    /// Delay between consecutive records in a batch.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Fetch `key` under the retry policy. Non-retryable errors end the
    /// attempts early.
    pub fn fetch_with_retry(&self, key: &RecordKey) -> std::result::Result<Vec<u8>, FetchError> {
        retry_when(
            &self.policy,
            |attempt| {
                tracing::debug!(key = %key, attempt, "fetch attempt");
                self.fetcher.fetch(key)
            },
            FetchError::is_retryable,
        )
    }

    /// Fetch and store one record, replacing it if it exists. No file is
    /// created when the fetch fails.
    pub fn add(&self, key: &RecordKey) -> Result<PathBuf> {
        if self.store.exists(key) {
            tracing::info!(key = %key, "record exists, it will be replaced");
        }
        let path = self.refresh_one(key)?;
        tracing::info!(key = %key, path = %path.display(), "record saved");
        Ok(path)
    }

    /// Refresh every record present when the run starts.
    ///
    /// Per-record fetch and write failures are logged and collected in the
    /// report; the old file stays in place. Only failing to create or list
    /// the directory is an error.
    pub fn refresh_all(&self) -> Result<BatchReport> {
        self.store.ensure()?;
        let keys = self.store.keys()?;
        let mut report = BatchReport::new(self.store.dir().to_path_buf(), keys.len());

        if keys.is_empty() {
            tracing::info!(dir = %self.store.dir().display(), "nothing to refresh");
            return Ok(report);
        }
        tracing::info!(
            dir = %self.store.dir().display(),
            records = keys.len(),
            "starting refresh"
        );

        let last = keys.len() - 1;
        for (i, key) in keys.into_iter().enumerate() {
            match self.refresh_one(&key) {
                Ok(_) => {
                    tracing::info!(key = %key, "record refreshed");
                    report.refreshed.push(key);
                }
                Err(e) => {
                    tracing::warn!(key = %key, "refresh failed, keeping existing record: {e}");
                    report.record_failure(key, &e);
                }
            }
            if i < last && !self.pace.is_zero() {
                std::thread::sleep(self.pace);
            }
        }

        tracing::info!(
            refreshed = report.refreshed.len(),
            failed = report.failed.len(),
            "refresh finished"
        );
        Ok(report)
    }

    fn refresh_one(&self, key: &RecordKey) -> Result<PathBuf> {
        let data = self
            .fetch_with_retry(key)
            .map_err(|source| SyncError::Fetch {
                key: key.to_string(),
                source,
            })?;
        self.store.write(key, &data)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};
    use tempfile::TempDir;

    type Reply = std::result::Result<Vec<u8>, FetchError>;

    /// Replays queued replies per key; an exhausted queue keeps failing.
    #[derive(Default)]
    struct Scripted {
        replies: RefCell<HashMap<String, VecDeque<Reply>>>,
        calls: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn reply(self, key: &str, reply: Reply) -> Self {
            self.replies
                .borrow_mut()
                .entry(key.to_string())
                .or_default()
                .push_back(reply);
            self
        }

        fn fail_times(mut self, key: &str, times: u32) -> Self {
            for _ in 0..times {
                self = self.reply(key, Err(FetchError::Network("connection reset".into())));
            }
            self
        }

        fn calls_for(&self, key: &str) -> usize {
            self.calls.borrow().iter().filter(|k| *k == key).count()
        }
    }

    impl Fetcher for Scripted {
        fn fetch(&self, key: &RecordKey) -> Reply {
            self.calls.borrow_mut().push(key.to_string());
            self.replies
                .borrow_mut()
                .get_mut(key.as_str())
                .and_then(|q| q.pop_front())
                .unwrap_or_else(|| Err(FetchError::Status { status: 503 }))
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::ZERO,
            timeout: Duration::from_secs(1),
        }
    }

    fn key(s: &str) -> RecordKey {
        RecordKey::new(s).unwrap()
    }

    fn seeded(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, body) in files {
            std::fs::write(dir.path().join(name), body).unwrap();
        }
        dir
    }

    fn runner<F: Fetcher>(dir: &TempDir, fetcher: F, max_attempts: u32) -> Runner<F> {
        Runner::new(
            RecordStore::new(dir.path(), "json"),
            fetcher,
            policy(max_attempts),
        )
    }

    fn read(dir: &TempDir, name: &str) -> String {
        std::fs::read_to_string(dir.path().join(name)).unwrap()
    }

    #[test]
    fn partial_failure_keeps_stale_record() {
        let dir = seeded(&[("a.json", r#"{"x":1}"#), ("b.json", r#"{"x":2}"#)]);
        let fetcher = Scripted::default().reply("a", Ok(br#"{"x":9}"#.to_vec()));
        let r = runner(&dir, fetcher, 3);

        let report = r.refresh_all().unwrap();

        assert_eq!(read(&dir, "a.json"), r#"{"x":9}"#);
        assert_eq!(read(&dir, "b.json"), r#"{"x":2}"#);
        assert_eq!(report.outcome, BatchOutcome::PartialFailure);
        assert_eq!(report.total, 2);
        assert_eq!(report.refreshed, vec![key("a")]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].key, key("b"));
        assert!(report.failed[0].reason.contains("503"));
        assert_eq!(r.fetcher.calls_for("b"), 3);
        assert!(report.summary().contains("kept existing data for b"));
    }

    #[test]
    fn all_succeeded() {
        let dir = seeded(&[("a.json", "old"), ("b.json", "old")]);
        let fetcher = Scripted::default()
            .reply("a", Ok(b"new-a".to_vec()))
            .reply("b", Ok(b"new-b".to_vec()));
        let report = runner(&dir, fetcher, 1).refresh_all().unwrap();

        assert_eq!(report.outcome, BatchOutcome::AllSucceeded);
        assert_eq!(read(&dir, "a.json"), "new-a");
        assert_eq!(read(&dir, "b.json"), "new-b");
        assert_eq!(report.summary(), "Refresh complete: 2/2 records refreshed.");
    }

    #[test]
    fn padded_file_name_is_left_alone() {
        let dir = seeded(&[("a .json", "old")]);
        let fetcher = Scripted::default().reply("a", Ok(b"new".to_vec()));
        let r = runner(&dir, fetcher, 1);

        let report = r.refresh_all().unwrap();

        assert!(report.is_empty());
        assert!(report.refreshed.is_empty());
        assert_eq!(r.fetcher.calls_for("a"), 0);
        assert_eq!(read(&dir, "a .json"), "old");
        assert!(!dir.path().join("a.json").exists());
    }

    #[test]
    fn records_processed_in_name_order() {
        let dir = seeded(&[("c.json", ""), ("a.json", ""), ("b.json", "")]);
        let r = runner(&dir, Scripted::default(), 1);
        r.refresh_all().unwrap();
        assert_eq!(*r.fetcher.calls.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_directory_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let r = runner(&dir, Scripted::default(), 3);

        let report = r.refresh_all().unwrap();

        assert!(report.is_empty());
        assert_eq!(report.outcome, BatchOutcome::AllSucceeded);
        assert!(report.summary().starts_with("Nothing to refresh"));
        assert!(r.fetcher.calls.borrow().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_directory_is_created() {
        let dir = TempDir::new().unwrap();
        let lookup = dir.path().join("card_set_lookup");
        let r = Runner::new(RecordStore::new(&lookup, "json"), Scripted::default(), policy(1));
        let report = r.refresh_all().unwrap();
        assert!(report.is_empty());
        assert!(lookup.is_dir());
    }

    #[test]
    fn unlistable_directory_is_fatal() {
        let dir = seeded(&[("lookup", "a file, not a directory")]);
        let r = Runner::new(
            RecordStore::new(dir.path().join("lookup"), "json"),
            Scripted::default(),
            policy(1),
        );
        assert!(matches!(r.refresh_all(), Err(SyncError::Enumerate { .. })));
    }

    #[test]
    fn failures_below_max_attempts_still_refresh() {
        let dir = seeded(&[("a.json", "old")]);
        let fetcher = Scripted::default()
            .fail_times("a", 2)
            .reply("a", Ok(b"new".to_vec()));
        let r = runner(&dir, fetcher, 3);

        let report = r.refresh_all().unwrap();

        assert_eq!(report.outcome, BatchOutcome::AllSucceeded);
        assert_eq!(read(&dir, "a.json"), "new");
        assert_eq!(r.fetcher.calls_for("a"), 3);
    }

    #[test]
    fn failures_reaching_max_attempts_keep_old_record() {
        let dir = seeded(&[("a.json", "old")]);
        let fetcher = Scripted::default()
            .fail_times("a", 3)
            .reply("a", Ok(b"new".to_vec()));
        let r = runner(&dir, fetcher, 3);

        let report = r.refresh_all().unwrap();

        assert_eq!(report.outcome, BatchOutcome::PartialFailure);
        assert_eq!(read(&dir, "a.json"), "old");
        assert_eq!(r.fetcher.calls_for("a"), 3);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let dir = seeded(&[("gone.json", "old")]);
        let fetcher = Scripted::default().reply("gone", Err(FetchError::Status { status: 404 }));
        let r = runner(&dir, fetcher, 5);

        let report = r.refresh_all().unwrap();

        assert_eq!(r.fetcher.calls_for("gone"), 1);
        assert_eq!(report.failed[0].reason, "remote returned HTTP 404");
        assert_eq!(read(&dir, "gone.json"), "old");
    }

    #[test]
    fn write_failure_is_recorded_and_batch_continues() {
        let dir = seeded(&[("a.json", "old"), ("b.json", "old")]);
        let root = dir.path().to_path_buf();
        // Turn a.json into a non-empty directory mid-run so the rename fails.
        let fetcher = move |k: &RecordKey| -> Reply {
            if k.as_str() == "a" {
                let p = root.join("a.json");
                std::fs::remove_file(&p).unwrap();
                std::fs::create_dir(&p).unwrap();
                std::fs::write(p.join("blocker"), b"x").unwrap();
            }
            Ok(b"new".to_vec())
        };
        let report = runner(&dir, fetcher, 1).refresh_all().unwrap();

        assert_eq!(report.outcome, BatchOutcome::PartialFailure);
        assert_eq!(report.failed[0].key, key("a"));
        assert!(report.failed[0].reason.starts_with("cannot write"));
        assert_eq!(report.refreshed, vec![key("b")]);
        assert_eq!(read(&dir, "b.json"), "new");
    }

    #[test]
    fn pace_between_records() {
        let dir = seeded(&[("a.json", ""), ("b.json", ""), ("c.json", "")]);
        let fetcher = |_: &RecordKey| -> Reply { Ok(Vec::new()) };
        let r = runner(&dir, fetcher, 1).with_pace(Duration::from_millis(25));

        let start = std::time::Instant::now();
        r.refresh_all().unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn add_writes_new_record() {
        let dir = TempDir::new().unwrap();
        let fetcher = Scripted::default().reply("base1", Ok(br#"{"data":[]}"#.to_vec()));
        let r = runner(&dir, fetcher, 3);

        let path = r.add(&key("base1")).unwrap();

        assert_eq!(path, dir.path().join("base1.json"));
        assert_eq!(read(&dir, "base1.json"), r#"{"data":[]}"#);
    }

    #[test]
    fn add_failure_creates_no_file() {
        let dir = TempDir::new().unwrap();
        let r = runner(&dir, Scripted::default().fail_times("base1", 3), 3);

        let err = r.add(&key("base1")).unwrap_err();

        assert!(matches!(err, SyncError::Fetch { ref key, .. } if key == "base1"));
        assert!(!dir.path().join("base1.json").exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(r.fetcher.calls_for("base1"), 3);
    }

    #[test]
    fn add_replaces_existing_record() {
        let dir = seeded(&[("base1.json", "old")]);
        let fetcher = Scripted::default().reply("base1", Ok(b"new".to_vec()));
        runner(&dir, fetcher, 1).add(&key("base1")).unwrap();
        assert_eq!(read(&dir, "base1.json"), "new");
    }
}
