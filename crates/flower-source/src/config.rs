use std::time::Duration;

/// Timeouts applied to every upstream request.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Limit for establishing the TCP (and TLS) connection.
    pub connect_timeout: Duration,
    /// Limit for the whole request, body included.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            timeout: Duration::from_secs(15),
            user_agent: concat!("flower-exporter/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
