use crate::{Labels, MetricName};

/// Mutation applied to one gauge series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    /// Overwrite the series value.
    Set(f64),
    /// Add one to the series value.
    Increment,
    /// Overwrite the series value with the current unix time in seconds.
    SetToCurrentTimestamp,
}

/// One pending write produced by a collector conversion.
///
/// Updates are transient: they are applied to the registry in order and then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricUpdate {
    pub metric: MetricName,
    pub labels: Labels,
    pub op: Operation,
}

impl MetricUpdate {
    pub fn new(metric: MetricName, labels: Labels, op: Operation) -> Self {
        Self { metric, labels, op }
    }

    pub fn set(metric: MetricName, labels: Labels, value: f64) -> Self {
        Self::new(metric, labels, Operation::Set(value))
    }

    pub fn increment(metric: MetricName, labels: Labels) -> Self {
        Self::new(metric, labels, Operation::Increment)
    }

    /// Returns `true` for the `Set(0)` writes emitted by reset passes.
    pub fn is_reset(&self) -> bool {
        matches!(self.op, Operation::Set(v) if v == 0.0)
    }
}
