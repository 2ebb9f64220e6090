use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format `{0}`, expected one of: {list}", list = crate::logger::format::LoggerFormat::NAMES.join(", "))]
    InvalidFormat(String),
    #[error("journald output needs Linux and the `journald` feature")]
    JournaldNotSupported,
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
    #[error("cannot install tracing subscriber: {0}")]
    InitializationFailed(String),
    #[error("bad log filter `{directive}`: {reason}")]
    InvalidLogLevel { directive: String, reason: String },
}
