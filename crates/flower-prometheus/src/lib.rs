//! Prometheus-backed series registry for the flower exporter.
//!
//! [`SeriesRegistry`] owns one `GaugeVec` per collector metric and remembers every label tuple it has written, so that publish and priming passes can reach series the current snapshot no longer mentions.
//! Every series is scoped by the upstream host through the leading [`flower_model::HOST_LABEL`].
//!
//! ## Example
//! ```rust
//! use flower_model::{Host, Labels, MetricDesc, MetricUpdate, ResetPolicy};
//! use flower_prometheus::SeriesRegistry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! const WORKERS: MetricDesc = MetricDesc {
//!     name: "celery_workers",
//!     help: "Number of alive workers",
//!     labels: &[],
//! };
//!
//! let registry = SeriesRegistry::new();
//! registry.register(&WORKERS)?;
//!
//! let host = Host::new("http://127.0.0.1:5555")?;
//! let updates = vec![
//!     MetricUpdate::set(WORKERS.name, Labels::new(), 0.0),
//!     MetricUpdate::increment(WORKERS.name, Labels::new()),
//! ];
//! registry.publish(&host, &WORKERS, &updates, ResetPolicy::ZeroStale)?;
//! assert_eq!(registry.value(&host, WORKERS.name, &Labels::new()), Some(1.0));
//!
//! let text = registry.encode_text()?;
//! assert!(text.contains("celery_workers{flower=\"http://127.0.0.1:5555\"} 1"));
//! # Ok(())
//! # }
//! ```
//!
//! ## HTTP Server
//! This crate does NOT serve `/metrics`; see `flower-api`.

mod error;
pub use error::RegistryError;

mod registry;
pub use registry::SeriesRegistry;

pub use prometheus::TEXT_FORMAT;
