use crate::MetricName;

/// Label prepended to every published series; its value is the upstream host.
///
/// Keeps workers for different hosts on disjoint series so reset and priming passes only touch their own.
pub const HOST_LABEL: &str = "flower";

/// Static description of a gauge family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDesc {
    pub name: MetricName,
    pub help: &'static str,
    /// Collector-level label names, in order, excluding [`HOST_LABEL`].
    pub labels: &'static [&'static str],
}

impl MetricDesc {
    /// Full label list as registered, host label first.
    pub fn label_names(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(self.labels.len() + 1);
        names.push(HOST_LABEL);
        names.extend_from_slice(self.labels);
        names
    }
}

/// How a publish step treats series that the current batch does not mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetPolicy {
    /// Zero every known series for the host that the batch does not write.
    ZeroStale,
    /// Leave unmentioned series at their last value.
    Overwrite,
}

/// Value written to already-known series when a poll loop starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimeValue {
    Zero,
    CurrentTimestamp,
}
