use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, trace};

use crate::{SnapshotSource, config::SourceConfig, errors::FetchError};

/// [`SnapshotSource`] backed by a pooled `reqwest` client with bounded timeouts.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(cfg: &SourceConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(cfg.connect_timeout)
            .timeout(cfg.timeout)
            .user_agent(cfg.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SnapshotSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        trace!(url, "sending request");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "upstream responded");
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
