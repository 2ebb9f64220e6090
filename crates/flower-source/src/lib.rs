//! Upstream snapshot fetching.
//!
//! A [`SnapshotSource`] performs exactly one GET per call and classifies the outcome into a [`FetchError`]; retry policy belongs to the caller.

mod config;
pub use config::SourceConfig;

mod errors;
pub use errors::FetchError;

mod http;
pub use http::HttpSource;

use async_trait::async_trait;
use serde_json::Value;

/// One-shot JSON fetcher.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// GET `url` once and decode the body as JSON.
    async fn fetch(&self, url: &str) -> Result<Value, FetchError>;
}
