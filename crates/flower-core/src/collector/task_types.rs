use flower_model::{Host, Labels, MetricDesc, MetricUpdate};
use serde_json::Value;

use super::{Collector, TASKS_PATH, fields};

pub const METRIC: MetricDesc = MetricDesc {
    name: "celery_task_types_by_state",
    help: "The count of each state for each task type",
    labels: &["task_type", "state"],
};

/// Count of tasks per `(task type, state)`, read from each task's `name` and `state`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskTypesByState;

impl Collector for TaskTypesByState {
    fn name(&self) -> &'static str {
        "task-types"
    }

    fn metric(&self) -> MetricDesc {
        METRIC
    }

    fn endpoint(&self, host: &Host) -> String {
        host.endpoint(TASKS_PATH)
    }

    fn convert(&self, document: &Value) -> Vec<MetricUpdate> {
        fields::count_by(document, METRIC.name, |_, task| {
            Labels::new()
                .with("task_type", fields::label(task, "name"))
                .with("state", fields::label(task, "state"))
        })
    }
}
