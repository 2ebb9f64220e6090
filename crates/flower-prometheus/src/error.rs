use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("metric is not registered: {0}")]
    UnknownMetric(String),

    #[error("metric {metric} already registered with different labels")]
    Conflict { metric: String },

    #[error("label mismatch for {metric}: expected {expected:?}, got {got:?}")]
    LabelMismatch {
        metric: String,
        expected: Vec<String>,
        got: Vec<String>,
    },

    #[error("failed to encode metrics: {0}")]
    Encode(String),
}
