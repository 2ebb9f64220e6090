use flower_model::{Host, Labels, MetricDesc, MetricUpdate};
use serde_json::Value;

use super::{Collector, WORKERS_PATH, fields};

pub const METRIC: MetricDesc = MetricDesc {
    name: "celery_workers",
    help: "Number of alive workers",
    labels: &[],
};

/// Number of workers known to Flower: one per top-level key of `/api/workers`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkersCount;

impl Collector for WorkersCount {
    fn name(&self) -> &'static str {
        "workers"
    }

    fn metric(&self) -> MetricDesc {
        METRIC
    }

    fn endpoint(&self, host: &Host) -> String {
        host.endpoint(WORKERS_PATH)
    }

    fn convert(&self, document: &Value) -> Vec<MetricUpdate> {
        let mut updates = vec![MetricUpdate::set(METRIC.name, Labels::new(), 0.0)];
        updates.extend(
            fields::entries(document).map(|_| MetricUpdate::increment(METRIC.name, Labels::new())),
        );
        updates
    }
}
