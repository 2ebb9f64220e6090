//! HTTP surface of the exporter: the Prometheus scrape endpoint and a liveness probe.

mod error;
pub use error::ApiError;

mod http;
pub use http::{HttpApi, serve};
