//! Collector variants: one upstream JSON shape each, converted into gauge updates.
//!
//! A collector is two pure functions, [`Collector::endpoint`] and [`Collector::convert`], plus the static description of the gauge it feeds.
//! Neither performs I/O, so every variant is testable against plain `serde_json` values.

use std::{fmt, str::FromStr};

use flower_model::{ApiPath, Host, MetricDesc, MetricUpdate, PrimeValue, ResetPolicy};
use serde_json::Value;

use crate::error::CoreError;

mod fields;

mod task_duration;
pub use task_duration::TaskDurationByState;

mod task_types;
pub use task_types::TaskTypesByState;

mod tasks_by_name;
pub use tasks_by_name::TasksByName;

mod workers;
pub use workers::WorkersCount;

/// Flower resource listing tasks keyed by task id.
pub const TASKS_PATH: ApiPath = "/api/tasks";
/// Flower resource listing workers keyed by worker name.
pub const WORKERS_PATH: ApiPath = "/api/workers";

pub trait Collector: Send + Sync + 'static {
    /// Stable short name, used in logs and on the command line.
    fn name(&self) -> &'static str;

    /// Gauge family this collector writes.
    fn metric(&self) -> MetricDesc;

    /// Upstream URL polled for `host`.
    fn endpoint(&self, host: &Host) -> String;

    /// Turn one snapshot into the updates for this cycle.
    ///
    /// Must be total: unexpected shapes degrade to default label values, never to an error.
    fn convert(&self, document: &Value) -> Vec<MetricUpdate>;

    /// Treatment of known series that the current batch does not mention.
    fn reset(&self) -> ResetPolicy {
        ResetPolicy::ZeroStale
    }

    /// Value written to already-known series before the first poll.
    fn prime(&self) -> PrimeValue {
        PrimeValue::Zero
    }
}

/// Closed set of collector variants the exporter can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectorKind {
    TaskTypes,
    TasksByName,
    TaskDuration,
    Workers,
}

impl CollectorKind {
    pub const ALL: [CollectorKind; 4] = [
        CollectorKind::TaskTypes,
        CollectorKind::TasksByName,
        CollectorKind::TaskDuration,
        CollectorKind::Workers,
    ];

    /// Variants started when none are configured explicitly.
    pub const DEFAULT: [CollectorKind; 3] = [
        CollectorKind::TaskDuration,
        CollectorKind::TaskTypes,
        CollectorKind::Workers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectorKind::TaskTypes => "task-types",
            CollectorKind::TasksByName => "tasks-by-name",
            CollectorKind::TaskDuration => "task-duration",
            CollectorKind::Workers => "workers",
        }
    }
}

impl Collector for CollectorKind {
    fn name(&self) -> &'static str {
        self.as_str()
    }

    fn metric(&self) -> MetricDesc {
        match self {
            CollectorKind::TaskTypes => TaskTypesByState.metric(),
            CollectorKind::TasksByName => TasksByName.metric(),
            CollectorKind::TaskDuration => TaskDurationByState.metric(),
            CollectorKind::Workers => WorkersCount.metric(),
        }
    }

    fn endpoint(&self, host: &Host) -> String {
        match self {
            CollectorKind::TaskTypes => TaskTypesByState.endpoint(host),
            CollectorKind::TasksByName => TasksByName.endpoint(host),
            CollectorKind::TaskDuration => TaskDurationByState.endpoint(host),
            CollectorKind::Workers => WorkersCount.endpoint(host),
        }
    }

    fn convert(&self, document: &Value) -> Vec<MetricUpdate> {
        match self {
            CollectorKind::TaskTypes => TaskTypesByState.convert(document),
            CollectorKind::TasksByName => TasksByName.convert(document),
            CollectorKind::TaskDuration => TaskDurationByState.convert(document),
            CollectorKind::Workers => WorkersCount.convert(document),
        }
    }

    fn reset(&self) -> ResetPolicy {
        match self {
            CollectorKind::TaskTypes => TaskTypesByState.reset(),
            CollectorKind::TasksByName => TasksByName.reset(),
            CollectorKind::TaskDuration => TaskDurationByState.reset(),
            CollectorKind::Workers => WorkersCount.reset(),
        }
    }

    fn prime(&self) -> PrimeValue {
        match self {
            CollectorKind::TaskTypes => TaskTypesByState.prime(),
            CollectorKind::TasksByName => TasksByName.prime(),
            CollectorKind::TaskDuration => TaskDurationByState.prime(),
            CollectorKind::Workers => WorkersCount.prime(),
        }
    }
}

impl fmt::Display for CollectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectorKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace('_', "-");
        match norm.as_str() {
            "task-types" | "task-types-by-state" => Ok(CollectorKind::TaskTypes),
            "tasks-by-name" => Ok(CollectorKind::TasksByName),
            "task-duration" | "task-duration-by-state" => Ok(CollectorKind::TaskDuration),
            "workers" => Ok(CollectorKind::Workers),
            _ => Err(CoreError::UnknownCollector(s.to_string())),
        }
    }
}
