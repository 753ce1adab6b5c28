pub mod add;
pub mod config;
pub mod list;
pub mod refresh;

use anyhow::Context;
use cardsync_core::config::{Config, WarnLevel};
use cardsync_core::{paths, HttpFetcher, RecordStore, Runner};
use std::path::PathBuf;

/// Settings shared by every command, resolved once from the global flags.
pub struct Ctx {
    pub root: PathBuf,
    /// `--dir`, taken as given rather than relative to `root`.
    pub dir: Option<PathBuf>,
    pub api_key: Option<String>,
    pub json: bool,
}

impl Ctx {
    pub fn config(&self) -> anyhow::Result<Config> {
        Config::load(&self.root).with_context(|| {
            format!(
                "failed to load {}",
                paths::config_path(&self.root).display()
            )
        })
    }

    pub fn store(&self, config: &Config) -> RecordStore {
        match &self.dir {
            Some(dir) => RecordStore::new(dir, config.extension.as_str()),
            None => config.store(&self.root),
        }
    }

    /// Build the HTTP-backed runner. Configuration errors are fatal here so
    /// no command starts fetching with a broken source.
    pub fn runner(&self) -> anyhow::Result<Runner<HttpFetcher>> {
        let config = self.config()?;

        let errors: Vec<String> = config
            .validate()
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .map(|w| w.message)
            .collect();
        if !errors.is_empty() {
            anyhow::bail!("invalid configuration: {}", errors.join("; "));
        }

        let policy = config.retry.policy();
        let fetcher = HttpFetcher::new(config.source.url.as_str(), policy.timeout)
            .context("failed to set up HTTP client")?
            .with_api_key(config.source.api_key_header.as_str(), self.api_key.clone());

        Ok(Runner::new(self.store(&config), fetcher, policy).with_pace(config.pace()))
    }
}
