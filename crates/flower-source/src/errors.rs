use thiserror::Error;

/// Classified failure of a single fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Upstream unreachable: DNS failure, refused connection, connect timeout or unusable URL.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Connected, but the response did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("upstream responded with HTTP {0}")]
    Status(u16),

    #[error("invalid JSON body: {0}")]
    Decode(String),
}

impl FetchError {
    /// Fatal errors end the poll loop; everything else is retried on the short delay.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::Connection(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        // Connect timeouts report both is_connect and is_timeout and classify as Connection.
        if e.is_connect() || e.is_builder() {
            return FetchError::Connection(e.to_string());
        }
        if e.is_timeout() {
            return FetchError::Timeout(e.to_string());
        }
        if let Some(status) = e.status() {
            return FetchError::Status(status.as_u16());
        }
        if e.is_body() || e.is_decode() {
            return FetchError::Decode(e.to_string());
        }
        FetchError::Connection(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_connection_is_fatal() {
        assert!(FetchError::Connection("refused".into()).is_fatal());
        assert!(!FetchError::Timeout("slow".into()).is_fatal());
        assert!(!FetchError::Status(503).is_fatal());
        assert!(!FetchError::Decode("eof".into()).is_fatal());
    }

    #[test]
    fn display_mentions_status() {
        assert_eq!(
            FetchError::Status(503).to_string(),
            "upstream responded with HTTP 503"
        );
    }
}
