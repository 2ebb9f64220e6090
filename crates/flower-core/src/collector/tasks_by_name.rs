use flower_model::{Host, Labels, MetricDesc, MetricUpdate};
use serde_json::Value;

use super::{Collector, TASKS_PATH, fields};

pub const METRIC: MetricDesc = MetricDesc {
    name: "celery_tasks_by_name",
    help: "Count of tasks by name and state",
    labels: &["name", "state"],
};

/// Count of tasks per `(task id, state)`; the task id is the document key.
#[derive(Debug, Clone, Copy, Default)]
pub struct TasksByName;

impl Collector for TasksByName {
    fn name(&self) -> &'static str {
        "tasks-by-name"
    }

    fn metric(&self) -> MetricDesc {
        METRIC
    }

    fn endpoint(&self, host: &Host) -> String {
        host.endpoint(TASKS_PATH)
    }

    fn convert(&self, document: &Value) -> Vec<MetricUpdate> {
        fields::count_by(document, METRIC.name, |id, task| {
            Labels::new()
                .with("name", id)
                .with("state", fields::label(task, "state"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flower_model::Operation;
    use serde_json::json;

    #[test]
    fn one_series_per_task_id() {
        let doc = json!({
            "5f1c": {"name": "add", "state": "STARTED"},
            "9a0b": {"state": "SUCCESS"},
        });
        let updates = TasksByName.convert(&doc);

        assert_eq!(updates.len(), 4);
        let increments: Vec<_> = updates
            .iter()
            .filter(|u| u.op == Operation::Increment)
            .map(|u| (u.labels.get("name").unwrap(), u.labels.get("state").unwrap()))
            .collect();
        assert!(increments.contains(&("5f1c", "STARTED")));
        assert!(increments.contains(&("9a0b", "SUCCESS")));
    }

    #[test]
    fn entry_without_state_uses_empty_label() {
        let updates = TasksByName.convert(&json!({"abc": null}));
        assert_eq!(updates[0].labels, Labels::new().with("name", "abc").with("state", ""));
    }
}
