pub mod config;
pub mod error;
pub mod fetch;
pub mod io;
pub mod paths;
pub mod retry;
pub mod runner;
pub mod store;

pub use error::{FetchError, Result, SyncError};
pub use fetch::{Fetcher, HttpFetcher};
pub use paths::RecordKey;
pub use retry::RetryPolicy;
pub use runner::{BatchOutcome, BatchReport, Runner};
pub use store::RecordStore;
