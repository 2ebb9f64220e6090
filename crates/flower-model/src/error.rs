use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("host url is empty")]
    EmptyHost,
    #[error("host url must start with http:// or https://: {0}")]
    InvalidScheme(String),
}
