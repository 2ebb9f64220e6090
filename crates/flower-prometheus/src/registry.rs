use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::{SystemTime, UNIX_EPOCH},
};

use flower_model::{
    Host, Labels, MetricDesc, MetricName, MetricUpdate, Operation, PrimeValue, ResetPolicy,
};
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder, proto::MetricFamily};
use tracing::{debug, trace};

use crate::error::RegistryError;

/// Thread-safe store of gauge series, shared by every poll loop and the scrape endpoint.
///
/// Cloning is cheap; all clones see the same series.
#[derive(Clone)]
pub struct SeriesRegistry {
    registry: Registry,
    families: Arc<RwLock<HashMap<MetricName, Family>>>,
}

struct Family {
    desc: MetricDesc,
    gauge: GaugeVec,
    /// Every label tuple ever written, host value first.
    known: HashSet<Vec<String>>,
}

impl Family {
    fn tuple(&self, scope: &Host, labels: &Labels) -> Result<Vec<String>, RegistryError> {
        if !labels.keys().eq(self.desc.labels.iter().copied()) {
            return Err(RegistryError::LabelMismatch {
                metric: self.desc.name.to_string(),
                expected: self.desc.labels.iter().map(|s| s.to_string()).collect(),
                got: labels.keys().map(str::to_string).collect(),
            });
        }
        let mut values = Vec::with_capacity(labels.len() + 1);
        values.push(scope.as_str().to_string());
        values.extend(labels.values().map(str::to_string));
        Ok(values)
    }

    fn write(&mut self, values: Vec<String>, op: Operation) {
        let gauge = {
            let refs: Vec<&str> = values.iter().map(String::as_str).collect();
            self.gauge.with_label_values(&refs)
        };
        match op {
            Operation::Set(v) => gauge.set(v),
            Operation::Increment => gauge.inc(),
            Operation::SetToCurrentTimestamp => gauge.set(unix_now()),
        }
        self.known.insert(values);
    }

    fn scoped<'a>(&'a self, scope: &'a Host) -> impl Iterator<Item = &'a Vec<String>> + 'a {
        self.known
            .iter()
            .filter(move |values| values.first().map(String::as_str) == Some(scope.as_str()))
    }
}

impl SeriesRegistry {
    /// Create a registry backed by a fresh `prometheus::Registry`.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            families: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register the gauge family for `desc`.
    ///
    /// Registering the same description twice is a no-op; the same name with different labels or help is a [`RegistryError::Conflict`].
    pub fn register(&self, desc: &MetricDesc) -> Result<(), RegistryError> {
        let mut families = self.write();

        if let Some(existing) = families.get(desc.name) {
            if existing.desc == *desc {
                return Ok(());
            }
            return Err(RegistryError::Conflict {
                metric: desc.name.to_string(),
            });
        }

        let gauge = GaugeVec::new(Opts::new(desc.name, desc.help), &desc.label_names())?;
        self.registry.register(Box::new(gauge.clone()))?;
        families.insert(
            desc.name,
            Family {
                desc: *desc,
                gauge,
                known: HashSet::new(),
            },
        );

        debug!(metric = desc.name, "metric registered");
        Ok(())
    }

    /// Apply one poll cycle's updates for `scope` under a single write lock.
    ///
    /// The whole batch is validated before anything is written, so a malformed batch leaves the registry untouched.
    /// With [`ResetPolicy::ZeroStale`] every known series of `scope` that the batch does not write is set to zero.
    /// Returns the number of series written, stale ones included.
    pub fn publish(
        &self,
        scope: &Host,
        desc: &MetricDesc,
        updates: &[MetricUpdate],
        reset: ResetPolicy,
    ) -> Result<usize, RegistryError> {
        let mut families = self.write();
        let family = families
            .get_mut(desc.name)
            .ok_or_else(|| RegistryError::UnknownMetric(desc.name.to_string()))?;

        let mut batch = Vec::with_capacity(updates.len());
        for update in updates {
            if update.metric != desc.name {
                return Err(RegistryError::UnknownMetric(update.metric.to_string()));
            }
            batch.push((family.tuple(scope, &update.labels)?, update.op));
        }

        let stale: Vec<Vec<String>> = match reset {
            ResetPolicy::ZeroStale => {
                let written: HashSet<&Vec<String>> = batch.iter().map(|(v, _)| v).collect();
                family
                    .scoped(scope)
                    .filter(|values| !written.contains(values))
                    .cloned()
                    .collect()
            }
            ResetPolicy::Overwrite => Vec::new(),
        };

        let mut series: HashSet<Vec<String>> = HashSet::with_capacity(batch.len());
        for (values, op) in batch {
            series.insert(values.clone());
            family.write(values, op);
        }
        let zeroed = stale.len();
        for values in stale {
            family.write(values, Operation::Set(0.0));
        }

        trace!(
            metric = desc.name,
            host = %scope,
            updates = updates.len(),
            zeroed,
            "batch published"
        );
        Ok(series.len() + zeroed)
    }

    /// Reset every known series of `scope` under `metric` to the priming value.
    ///
    /// Returns the number of series touched.
    pub fn prime(
        &self,
        scope: &Host,
        metric: MetricName,
        value: PrimeValue,
    ) -> Result<usize, RegistryError> {
        let mut families = self.write();
        let family = families
            .get_mut(metric)
            .ok_or_else(|| RegistryError::UnknownMetric(metric.to_string()))?;

        let op = match value {
            PrimeValue::Zero => Operation::Set(0.0),
            PrimeValue::CurrentTimestamp => Operation::SetToCurrentTimestamp,
        };
        let series: Vec<Vec<String>> = family.scoped(scope).cloned().collect();
        let count = series.len();
        for values in series {
            family.write(values, op);
        }
        Ok(count)
    }

    /// Current value of one series, if it has ever been written.
    pub fn value(&self, scope: &Host, metric: MetricName, labels: &Labels) -> Option<f64> {
        let families = self.read();
        let family = families.get(metric)?;
        let values = family.tuple(scope, labels).ok()?;
        if !family.known.contains(&values) {
            return None;
        }
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        family
            .gauge
            .get_metric_with_label_values(&refs)
            .ok()
            .map(|g| g.get())
    }

    /// Label sets of every known series of `scope` under `metric`, host label excluded.
    pub fn series(&self, scope: &Host, metric: MetricName) -> Vec<Labels> {
        let families = self.read();
        let Some(family) = families.get(metric) else {
            return Vec::new();
        };
        family
            .scoped(scope)
            .map(|values| {
                family
                    .desc
                    .labels
                    .iter()
                    .copied()
                    .zip(values.iter().skip(1).cloned())
                    .collect()
            })
            .collect()
    }

    /// Snapshot every registered family.
    ///
    /// Holds the read lock while gathering, so a scrape never observes a batch half applied.
    pub fn gather(&self) -> Vec<MetricFamily> {
        let _families = self.read();
        self.registry.gather()
    }

    /// Render every registered family in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, RegistryError> {
        let families = self.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| RegistryError::Encode(e.to_string()))
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<MetricName, Family>> {
        self.families.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<MetricName, Family>> {
        self.families.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SeriesRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPES: MetricDesc = MetricDesc {
        name: "celery_task_types_by_state",
        help: "The count of each state for each task type",
        labels: &["task_type", "state"],
    };

    const DURATION: MetricDesc = MetricDesc {
        name: "celery_task_duration_by_state",
        help: "Runtime for each task and state",
        labels: &["name", "state"],
    };

    fn host(url: &str) -> Host {
        Host::new(url).unwrap()
    }

    fn types(task_type: &str, state: &str) -> Labels {
        Labels::new().with("task_type", task_type).with("state", state)
    }

    fn counted(pairs: &[(&str, &str)]) -> Vec<MetricUpdate> {
        let mut updates: Vec<MetricUpdate> = pairs
            .iter()
            .map(|(t, s)| MetricUpdate::set(TYPES.name, types(t, s), 0.0))
            .collect();
        updates.extend(
            pairs
                .iter()
                .map(|(t, s)| MetricUpdate::increment(TYPES.name, types(t, s))),
        );
        updates
    }

    #[test]
    fn register_is_idempotent_but_rejects_conflicts() {
        let registry = SeriesRegistry::new();
        registry.register(&TYPES).unwrap();
        registry.register(&TYPES).unwrap();

        let clash = MetricDesc {
            labels: &["task_type"],
            ..TYPES
        };
        assert!(matches!(
            registry.register(&clash),
            Err(RegistryError::Conflict { .. })
        ));
    }

    #[test]
    fn zero_stale_resets_series_missing_from_batch() {
        let registry = SeriesRegistry::new();
        registry.register(&TYPES).unwrap();
        let h = host("http://flower:5555");

        registry
            .publish(
                &h,
                &TYPES,
                &counted(&[("add", "SUCCESS"), ("add", "SUCCESS")]),
                ResetPolicy::ZeroStale,
            )
            .unwrap();
        assert_eq!(
            registry.value(&h, TYPES.name, &types("add", "SUCCESS")),
            Some(2.0)
        );

        registry
            .publish(
                &h,
                &TYPES,
                &counted(&[("mul", "FAILURE")]),
                ResetPolicy::ZeroStale,
            )
            .unwrap();
        assert_eq!(
            registry.value(&h, TYPES.name, &types("add", "SUCCESS")),
            Some(0.0)
        );
        assert_eq!(
            registry.value(&h, TYPES.name, &types("mul", "FAILURE")),
            Some(1.0)
        );
    }

    #[test]
    fn stale_sweep_is_scoped_to_host() {
        let registry = SeriesRegistry::new();
        registry.register(&TYPES).unwrap();
        let a = host("http://a:5555");
        let b = host("http://b:5555");

        registry
            .publish(&a, &TYPES, &counted(&[("add", "SUCCESS")]), ResetPolicy::ZeroStale)
            .unwrap();
        registry
            .publish(&b, &TYPES, &[], ResetPolicy::ZeroStale)
            .unwrap();

        assert_eq!(
            registry.value(&a, TYPES.name, &types("add", "SUCCESS")),
            Some(1.0)
        );
        assert!(registry.series(&b, TYPES.name).is_empty());
    }

    #[test]
    fn overwrite_keeps_unmentioned_series() {
        let registry = SeriesRegistry::new();
        registry.register(&DURATION).unwrap();
        let h = host("http://flower:5555");
        let t1 = Labels::new().with("name", "t1").with("state", "SUCCESS");
        let t2 = Labels::new().with("name", "t2").with("state", "STARTED");

        registry
            .publish(
                &h,
                &DURATION,
                &[
                    MetricUpdate::set(DURATION.name, t1.clone(), 1.5),
                    MetricUpdate::set(DURATION.name, t2.clone(), 0.25),
                ],
                ResetPolicy::Overwrite,
            )
            .unwrap();
        registry
            .publish(
                &h,
                &DURATION,
                &[MetricUpdate::set(DURATION.name, t2.clone(), 3.0)],
                ResetPolicy::Overwrite,
            )
            .unwrap();

        assert_eq!(registry.value(&h, DURATION.name, &t1), Some(1.5));
        assert_eq!(registry.value(&h, DURATION.name, &t2), Some(3.0));
    }

    #[test]
    fn malformed_batch_writes_nothing() {
        let registry = SeriesRegistry::new();
        registry.register(&TYPES).unwrap();
        let h = host("http://flower:5555");

        let updates = vec![
            MetricUpdate::increment(TYPES.name, types("add", "SUCCESS")),
            MetricUpdate::increment(TYPES.name, Labels::single("state", "SUCCESS")),
        ];
        let err = registry
            .publish(&h, &TYPES, &updates, ResetPolicy::ZeroStale)
            .unwrap_err();

        assert!(matches!(err, RegistryError::LabelMismatch { .. }));
        assert!(registry.series(&h, TYPES.name).is_empty());
    }

    #[test]
    fn publish_requires_registration() {
        let registry = SeriesRegistry::new();
        let h = host("http://flower:5555");
        assert!(matches!(
            registry.publish(&h, &TYPES, &[], ResetPolicy::ZeroStale),
            Err(RegistryError::UnknownMetric(_))
        ));
        assert!(matches!(
            registry.prime(&h, TYPES.name, PrimeValue::Zero),
            Err(RegistryError::UnknownMetric(_))
        ));
    }

    #[test]
    fn prime_zero_and_timestamp() {
        let registry = SeriesRegistry::new();
        registry.register(&TYPES).unwrap();
        registry.register(&DURATION).unwrap();
        let h = host("http://flower:5555");
        let t1 = Labels::new().with("name", "t1").with("state", "SUCCESS");

        registry
            .publish(&h, &TYPES, &counted(&[("add", "SUCCESS")]), ResetPolicy::ZeroStale)
            .unwrap();
        registry
            .publish(
                &h,
                &DURATION,
                &[MetricUpdate::set(DURATION.name, t1.clone(), 2.0)],
                ResetPolicy::Overwrite,
            )
            .unwrap();

        assert_eq!(registry.prime(&h, TYPES.name, PrimeValue::Zero).unwrap(), 1);
        assert_eq!(
            registry.value(&h, TYPES.name, &types("add", "SUCCESS")),
            Some(0.0)
        );

        let before = unix_now();
        registry
            .prime(&h, DURATION.name, PrimeValue::CurrentTimestamp)
            .unwrap();
        let stamped = registry.value(&h, DURATION.name, &t1).unwrap();
        assert!(stamped >= before);
    }

    #[test]
    fn encodes_host_label_first() {
        let registry = SeriesRegistry::new();
        registry.register(&TYPES).unwrap();
        let h = host("http://flower:5555");
        registry
            .publish(&h, &TYPES, &counted(&[("add", "SUCCESS")]), ResetPolicy::ZeroStale)
            .unwrap();

        let text = registry.encode_text().unwrap();
        assert!(text.contains("# TYPE celery_task_types_by_state gauge"));
        assert!(text.contains(
            r#"celery_task_types_by_state{flower="http://flower:5555",state="SUCCESS",task_type="add"} 1"#
        ));
    }

    #[test]
    fn scrapes_never_see_a_partial_batch() {
        const WORKERS: MetricDesc = MetricDesc {
            name: "celery_workers",
            help: "Number of alive workers",
            labels: &[],
        };
        let registry = SeriesRegistry::new();
        registry.register(&WORKERS).unwrap();
        let h = host("http://flower:5555");

        let mut batch = vec![MetricUpdate::set(WORKERS.name, Labels::new(), 0.0)];
        batch.extend((0..500).map(|_| MetricUpdate::increment(WORKERS.name, Labels::new())));
        registry
            .publish(&h, &WORKERS, &batch, ResetPolicy::ZeroStale)
            .unwrap();

        let writer = {
            let registry = registry.clone();
            let h = h.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    registry
                        .publish(&h, &WORKERS, &batch, ResetPolicy::ZeroStale)
                        .unwrap();
                }
            })
        };

        let prefix = "celery_workers{flower=\"http://flower:5555\"} ";
        let mut torn = Vec::new();
        while !writer.is_finished() {
            let text = registry.encode_text().unwrap();
            let value: f64 = text
                .lines()
                .find_map(|line| line.strip_prefix(prefix))
                .unwrap()
                .parse()
                .unwrap();
            if value != 500.0 {
                torn.push(value);
            }
        }
        writer.join().unwrap();

        assert!(torn.is_empty(), "partial scrapes: {torn:?}");
    }

    #[test]
    fn concurrent_writers_on_separate_hosts() {
        let registry = SeriesRegistry::new();
        registry.register(&TYPES).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let h = host(&format!("http://flower-{i}:5555"));
                    for _ in 0..50 {
                        registry
                            .publish(
                                &h,
                                &TYPES,
                                &counted(&[("add", "SUCCESS"), ("add", "SUCCESS")]),
                                ResetPolicy::ZeroStale,
                            )
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..4 {
            let h = host(&format!("http://flower-{i}:5555"));
            assert_eq!(
                registry.value(&h, TYPES.name, &types("add", "SUCCESS")),
                Some(2.0)
            );
        }
    }
}
