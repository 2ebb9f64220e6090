use std::collections::HashSet;

use flower_model::{Labels, MetricName, MetricUpdate};
use serde_json::Value;

/// Top-level `(key, entry)` pairs of a keyed document; nothing for any other JSON shape.
pub(crate) fn entries(document: &Value) -> impl Iterator<Item = (&str, &Value)> {
    document
        .as_object()
        .into_iter()
        .flat_map(|map| map.iter().map(|(k, v)| (k.as_str(), v)))
}

/// Field of an entry rendered as a label value.
///
/// Strings are taken verbatim, null or absent fields (or a non-object entry) give `""`, other scalars use their JSON text.
pub(crate) fn label(entry: &Value, field: &str) -> String {
    match entry.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Field of an entry read as a number; numeric strings are parsed, anything else is `0`.
pub(crate) fn number(entry: &Value, field: &str) -> f64 {
    match entry.get(field) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Zero-then-increment conversion for counting gauges.
///
/// Emits one `Set(0)` per distinct label set (first-seen order), then one `Increment` per entry, so the published value equals the entry count in this snapshot.
pub(crate) fn count_by<F>(document: &Value, metric: MetricName, mut labels_of: F) -> Vec<MetricUpdate>
where
    F: FnMut(&str, &Value) -> Labels,
{
    let tuples: Vec<Labels> = entries(document)
        .map(|(key, entry)| labels_of(key, entry))
        .collect();

    let mut seen = HashSet::with_capacity(tuples.len());
    let mut updates = Vec::with_capacity(tuples.len() * 2);
    for labels in &tuples {
        if seen.insert(labels) {
            updates.push(MetricUpdate::set(metric, labels.clone(), 0.0));
        }
    }
    updates.extend(
        tuples
            .iter()
            .map(|labels| MetricUpdate::increment(metric, labels.clone())),
    );
    updates
}
