//! Poll loop lifecycle events and their log rendering.
//!
//! Every state transition that matters to an operator is described by a [`PollEvent`] and logged through [`log_event`], so levels and wording live in one place.

use std::{fmt, time::Duration};

use flower_model::Host;
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // setup
    LoopStarting,
    SeriesPrimed,
    SetupFailed,

    // cycle
    FetchStarted,
    SnapshotPublished,
    PublishFailed,

    // upstream
    UpstreamRejected,
    UpstreamUnreachable,

    // terminal
    LoopCancelled,
}

/// One lifecycle event of the poll loop for `(host, collector)`.
#[derive(Debug, Clone)]
pub struct PollEvent<'a> {
    pub kind: EventKind,
    pub host: &'a Host,
    pub collector: &'static str,
    pub url: Option<&'a str>,
    pub reason: Option<String>,
    pub series: usize,
    pub delay: Option<Duration>,
}

impl<'a> PollEvent<'a> {
    pub fn new(kind: EventKind, host: &'a Host, collector: &'static str) -> Self {
        Self {
            kind,
            host,
            collector,
            url: None,
            reason: None,
            series: 0,
            delay: None,
        }
    }

    pub fn with_url(mut self, url: &'a str) -> Self {
        self.url = Some(url);
        self
    }

    pub fn with_reason(mut self, reason: impl fmt::Display) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    pub fn with_series(mut self, series: usize) -> Self {
        self.series = series;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    #[inline]
    pub fn as_url(&self) -> &str {
        self.url.unwrap_or("unknown")
    }

    #[inline]
    pub fn as_reason(&self) -> &str {
        self.reason.as_deref().unwrap_or("unknown")
    }

    #[inline]
    pub fn delay_ms(&self) -> u64 {
        self.delay.map(|d| d.as_millis() as u64).unwrap_or(0)
    }
}

#[inline]
pub fn message_for(kind: EventKind) -> &'static str {
    match kind {
        EventKind::LoopStarting => "poll loop starting",
        EventKind::SeriesPrimed => "known series primed before first poll",
        EventKind::SetupFailed => "metric setup failed; polling anyway",
        EventKind::FetchStarted => "fetching snapshot",
        EventKind::SnapshotPublished => "snapshot published",
        EventKind::PublishFailed => "publish rejected by registry; batch dropped",
        EventKind::UpstreamRejected => "error receiving data; retry scheduled",
        EventKind::UpstreamUnreachable => "upstream unreachable; poll loop terminated",
        EventKind::LoopCancelled => "poll loop cancelled",
    }
}

pub fn log_event(e: &PollEvent<'_>) {
    let msg = message_for(e.kind);
    let host = e.host.as_str();
    let collector = e.collector;

    match e.kind {
        EventKind::LoopStarting => info!(host, collector, "{msg}"),
        EventKind::SeriesPrimed => debug!(host, collector, series = e.series, "{msg}"),
        EventKind::SetupFailed => error!(host, collector, reason = e.as_reason(), "{msg}"),

        EventKind::FetchStarted => trace!(host, collector, url = e.as_url(), "{msg}"),
        EventKind::SnapshotPublished => {
            debug!(host, collector, series = e.series, "{msg}")
        }
        EventKind::PublishFailed => error!(host, collector, reason = e.as_reason(), "{msg}"),

        EventKind::UpstreamRejected => warn!(
            host,
            collector,
            url = e.as_url(),
            reason = e.as_reason(),
            delay_ms = e.delay_ms(),
            "{msg}"
        ),
        EventKind::UpstreamUnreachable => error!(
            host,
            collector,
            url = e.as_url(),
            reason = e.as_reason(),
            "{msg}"
        ),

        EventKind::LoopCancelled => debug!(host, collector, "{msg}"),
    }
}
