//! The per-(host, collector) polling state machine.
//!
//! ```text
//! setup ─▶ Fetching ──Ok──▶ Converting ─▶ Publishing ─▶ Sleeping(interval) ─┐
//!             ▲  │                                                            │
//!             │  ├─ status / decode / timeout ─▶ Sleeping(retry) ───────────┤
//!             │  └─ connection failed ─▶ Terminated(Disconnected)            │
//!             └───────────────────────────────────────────────────────────────┘
//!                         cancelled while sleeping ─▶ Terminated(Cancelled)
//! ```

use std::time::Duration;

use flower_model::{Host, MetricUpdate};
use flower_prometheus::SeriesRegistry;
use flower_source::{FetchError, SnapshotSource};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::{
    collector::Collector,
    events::{EventKind, PollEvent, log_event},
};

/// Delays between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause after a published cycle.
    pub interval: Duration,
    /// Pause after a transient upstream failure.
    pub retry: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            retry: Duration::from_secs(1),
        }
    }
}

#[derive(Debug)]
pub enum PollState {
    Fetching,
    Converting(Value),
    Publishing(Vec<MetricUpdate>),
    Sleeping(Duration),
    Terminated(Termination),
}

/// Why a poll loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The upstream could not be reached; the loop does not retry.
    Disconnected(FetchError),
    /// The cancellation token fired while the loop was sleeping.
    Cancelled,
}

/// Drives one collector against one host until it terminates.
///
/// Cycles never overlap: the next fetch starts only after the previous cycle's sleep.
/// An in-flight fetch is never interrupted; cancellation is observed while sleeping.
pub struct PollLoop<C, S> {
    host: Host,
    collector: C,
    source: S,
    registry: SeriesRegistry,
    config: PollConfig,
    cancel: CancellationToken,
}

impl<C, S> PollLoop<C, S>
where
    C: Collector,
    S: SnapshotSource,
{
    pub fn new(
        host: Host,
        collector: C,
        source: S,
        registry: SeriesRegistry,
        config: PollConfig,
    ) -> Self {
        Self {
            host,
            collector,
            source,
            registry,
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Register the collector's gauge and prime the series already known for this host.
    ///
    /// Failures are logged, not returned: the loop can still poll, and publishing will report the same error.
    pub fn setup(&self) {
        let desc = self.collector.metric();
        let primed = self.registry.register(&desc).and_then(|()| {
            self.registry
                .prime(&self.host, desc.name, self.collector.prime())
        });

        match primed {
            Ok(series) => log_event(&self.event(EventKind::SeriesPrimed).with_series(series)),
            Err(e) => log_event(&self.event(EventKind::SetupFailed).with_reason(e)),
        }
    }

    /// Run setup, then cycle until terminated.
    pub async fn run(self) -> Termination {
        log_event(&self.event(EventKind::LoopStarting));
        self.setup();

        let mut state = PollState::Fetching;
        loop {
            state = match state {
                PollState::Terminated(reason) => return reason,
                other => self.step(other).await,
            };
        }
    }

    /// Perform one transition.
    pub async fn step(&self, state: PollState) -> PollState {
        match state {
            PollState::Fetching => self.fetch().await,
            PollState::Converting(document) => {
                PollState::Publishing(self.collector.convert(&document))
            }
            PollState::Publishing(updates) => {
                self.publish(&updates);
                PollState::Sleeping(self.config.interval)
            }
            PollState::Sleeping(delay) => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        log_event(&self.event(EventKind::LoopCancelled));
                        PollState::Terminated(Termination::Cancelled)
                    }
                    _ = tokio::time::sleep(delay) => PollState::Fetching,
                }
            }
            PollState::Terminated(reason) => PollState::Terminated(reason),
        }
    }

    async fn fetch(&self) -> PollState {
        let url = self.collector.endpoint(&self.host);
        log_event(&self.event(EventKind::FetchStarted).with_url(&url));

        match self.source.fetch(&url).await {
            Ok(document) => PollState::Converting(document),
            Err(e) if e.is_fatal() => {
                log_event(
                    &self
                        .event(EventKind::UpstreamUnreachable)
                        .with_url(&url)
                        .with_reason(&e),
                );
                PollState::Terminated(Termination::Disconnected(e))
            }
            Err(e) => {
                log_event(
                    &self
                        .event(EventKind::UpstreamRejected)
                        .with_url(&url)
                        .with_reason(&e)
                        .with_delay(self.config.retry),
                );
                PollState::Sleeping(self.config.retry)
            }
        }
    }

    fn publish(&self, updates: &[MetricUpdate]) {
        let desc = self.collector.metric();
        match self
            .registry
            .publish(&self.host, &desc, updates, self.collector.reset())
        {
            Ok(series) => log_event(&self.event(EventKind::SnapshotPublished).with_series(series)),
            Err(e) => log_event(&self.event(EventKind::PublishFailed).with_reason(e)),
        }
    }

    fn event(&self, kind: EventKind) -> PollEvent<'_> {
        PollEvent::new(kind, &self.host, self.collector.name())
    }
}
