use flower_model::{Host, Labels, MetricDesc, MetricUpdate, PrimeValue, ResetPolicy};
use serde_json::Value;

use super::{Collector, TASKS_PATH, fields};

pub const METRIC: MetricDesc = MetricDesc {
    name: "celery_task_duration_by_state",
    help: "Runtime for each task and state",
    labels: &["name", "state"],
};

/// Runtime in seconds of every task, labelled by task id and state.
///
/// Every task present in the snapshot is rewritten each cycle, so no zeroing pass is needed.
/// Known series are stamped with the current time on start-up instead of being zeroed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskDurationByState;

impl Collector for TaskDurationByState {
    fn name(&self) -> &'static str {
        "task-duration"
    }

    fn metric(&self) -> MetricDesc {
        METRIC
    }

    fn endpoint(&self, host: &Host) -> String {
        host.endpoint(TASKS_PATH)
    }

    fn convert(&self, document: &Value) -> Vec<MetricUpdate> {
        fields::entries(document)
            .map(|(id, task)| {
                let labels = Labels::new()
                    .with("name", id)
                    .with("state", fields::label(task, "state"));
                MetricUpdate::set(METRIC.name, labels, fields::number(task, "runtime"))
            })
            .collect()
    }

    fn reset(&self) -> ResetPolicy {
        ResetPolicy::Overwrite
    }

    fn prime(&self) -> PrimeValue {
        PrimeValue::CurrentTimestamp
    }
}
