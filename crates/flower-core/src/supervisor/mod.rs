use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use flower_model::Host;
use flower_prometheus::SeriesRegistry;
use flower_source::SnapshotSource;
use tokio::task::{Id, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    collector::{Collector, CollectorKind},
    error::CoreError,
    poll::{PollConfig, PollLoop, Termination},
};

/// Identity of one poll loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkerId {
    pub host: Host,
    pub collector: &'static str,
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.host, self.collector)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    Terminated(Termination),
    Panicked(String),
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub id: WorkerId,
    pub exit: WorkerExit,
}

/// Owns one poll loop per `(host, collector)` pair.
///
/// Loops are independent: one terminating (or panicking) never affects the others.
/// Dropping the supervisor aborts every loop still running.
pub struct Supervisor {
    registry: SeriesRegistry,
    config: PollConfig,
    cancel: CancellationToken,
    workers: JoinSet<Termination>,
    ids: HashMap<Id, WorkerId>,
    alive: Arc<AtomicUsize>,
}

struct AliveGuard(Arc<AtomicUsize>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Supervisor {
    pub fn new(registry: SeriesRegistry, config: PollConfig) -> Self {
        Self {
            registry,
            config,
            cancel: CancellationToken::new(),
            workers: JoinSet::new(),
            ids: HashMap::new(),
            alive: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start every `collectors × hosts` loop, sharing `source` between them.
    ///
    /// Duplicate hosts or collectors are started once. Must be called inside a tokio runtime.
    #[instrument(level = "debug", skip_all, fields(hosts = hosts.len(), collectors = collectors.len()))]
    pub fn start<S>(
        registry: SeriesRegistry,
        hosts: &[Host],
        collectors: &[CollectorKind],
        source: S,
        config: PollConfig,
    ) -> Result<Self, CoreError>
    where
        S: SnapshotSource + Clone + 'static,
    {
        if hosts.is_empty() {
            return Err(CoreError::Empty("no hosts configured"));
        }
        if collectors.is_empty() {
            return Err(CoreError::Empty("no collectors configured"));
        }

        let mut sup = Self::new(registry, config);
        let mut started = Vec::new();
        for host in hosts {
            for kind in collectors {
                let id = WorkerId {
                    host: host.clone(),
                    collector: kind.name(),
                };
                if started.contains(&id) {
                    continue;
                }
                sup.spawn(host.clone(), *kind, source.clone())?;
                started.push(id);
            }
        }

        info!(workers = started.len(), "supervisor started");
        Ok(sup)
    }

    /// Register the collector's gauge and spawn its poll loop for `host`.
    pub fn spawn<C, S>(&mut self, host: Host, collector: C, source: S) -> Result<WorkerId, CoreError>
    where
        C: Collector,
        S: SnapshotSource + 'static,
    {
        self.registry.register(&collector.metric())?;

        let id = WorkerId {
            host: host.clone(),
            collector: collector.name(),
        };
        let poll = PollLoop::new(host, collector, source, self.registry.clone(), self.config)
            .with_cancellation(self.cancel.child_token());

        self.alive.fetch_add(1, Ordering::AcqRel);
        let guard = AliveGuard(Arc::clone(&self.alive));
        let handle = self.workers.spawn(async move {
            let _guard = guard;
            poll.run().await
        });

        debug!(worker = %id, "poll loop spawned");
        self.ids.insert(handle.id(), id.clone());
        Ok(id)
    }

    /// Number of loops that have not terminated yet.
    pub fn running(&self) -> usize {
        self.alive.load(Ordering::Acquire)
    }

    /// Ask every loop to stop at its next sleep; in-flight fetches complete first.
    pub fn shutdown(&self) {
        info!("supervisor shutdown requested");
        self.cancel.cancel();
    }

    /// Wait for the next loop to end. `None` once every loop has been reported.
    pub async fn next_exit(&mut self) -> Option<WorkerReport> {
        loop {
            let (task, exit) = match self.workers.join_next_with_id().await? {
                Ok((task, termination)) => (task, WorkerExit::Terminated(termination)),
                Err(e) if e.is_panic() => (e.id(), WorkerExit::Panicked(e.to_string())),
                Err(e) => (e.id(), WorkerExit::Aborted),
            };
            let Some(id) = self.ids.remove(&task) else {
                continue;
            };

            match &exit {
                WorkerExit::Terminated(Termination::Disconnected(e)) => {
                    warn!(worker = %id, reason = %e, "worker terminated")
                }
                WorkerExit::Terminated(Termination::Cancelled) => {
                    debug!(worker = %id, "worker stopped")
                }
                WorkerExit::Panicked(reason) => error!(worker = %id, reason = %reason, "worker panicked"),
                WorkerExit::Aborted => debug!(worker = %id, "worker aborted"),
            }
            return Some(WorkerReport { id, exit });
        }
    }

    /// Wait until every loop has terminated and report each one.
    pub async fn join(mut self) -> Vec<WorkerReport> {
        let mut reports = Vec::with_capacity(self.ids.len());
        while let Some(report) = self.next_exit().await {
            reports.push(report);
        }
        reports
    }
}
