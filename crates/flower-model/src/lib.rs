mod error;
pub use error::ModelError;

mod host;
pub use host::Host;

mod labels;
pub use labels::Labels;

mod update;
pub use update::{MetricUpdate, Operation};

mod metric;
pub use metric::{HOST_LABEL, MetricDesc, PrimeValue, ResetPolicy};

/// Metric name as registered in the series registry.
pub type MetricName = &'static str;

/// Path of an upstream API resource relative to a [`Host`] (e.g. `"/api/tasks"`).
pub type ApiPath = &'static str;
