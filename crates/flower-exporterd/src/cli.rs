use std::time::Duration;

use clap::Parser;
use flower_core::{CollectorKind, PollConfig};
use flower_model::{Host, ModelError};
use flower_observe::{LoggerConfig, LoggerFormat};
use flower_source::SourceConfig;

#[derive(Debug, Parser)]
#[command(
    name = "flower-exporterd",
    version,
    about = "Exports Celery task and worker gauges read from Flower to Prometheus"
)]
pub struct Cli {
    /// Flower base URLs; the environment form is whitespace separated.
    #[arg(
        long = "flower",
        env = "FLOWER_HOSTS_LIST",
        num_args = 1..,
        default_value = "http://127.0.0.1:5555"
    )]
    pub flower: Vec<String>,

    /// Address the metrics endpoint listens on, `host:port`; host names are resolved.
    #[arg(long, env = "DEFAULT_ADDR", default_value = "0.0.0.0:8888")]
    pub addr: String,

    /// Log at debug level.
    #[arg(long)]
    pub verbose: bool,

    /// Explicit filter directive, e.g. `info,flower_core=trace`; wins over `--verbose`.
    #[arg(long, env = "FLOWER_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[arg(long, env = "FLOWER_LOG_FORMAT", default_value = "text", value_parser = parse_format)]
    pub log_format: LoggerFormat,

    /// Collectors started for every host.
    #[arg(
        long,
        env = "FLOWER_COLLECTORS",
        value_delimiter = ',',
        default_values = ["task-duration", "task-types", "workers"],
        value_parser = parse_collector
    )]
    pub collectors: Vec<CollectorKind>,

    /// Pause after a published cycle.
    #[arg(long, default_value_t = 10_000, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: u64,

    /// Pause after a failed fetch.
    #[arg(long, default_value_t = 1_000, value_parser = clap::value_parser!(u64).range(1..))]
    pub retry_ms: u64,

    #[arg(long, default_value_t = 3_000)]
    pub connect_timeout_ms: u64,

    #[arg(long, default_value_t = 15_000)]
    pub timeout_ms: u64,
}

impl Cli {
    /// Upstream hosts, splitting values on whitespace.
    pub fn hosts(&self) -> Result<Vec<Host>, ModelError> {
        self.flower
            .iter()
            .flat_map(|v| v.split_whitespace())
            .map(str::parse)
            .collect()
    }

    pub fn logger_config(&self) -> LoggerConfig {
        let mut cfg = LoggerConfig::verbosity(self.verbose);
        if let Some(level) = &self.log_level {
            cfg.level = level.clone();
        }
        cfg.format = self.log_format;
        cfg
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.interval_ms),
            retry: Duration::from_millis(self.retry_ms),
        }
    }

    pub fn source_config(&self) -> SourceConfig {
        SourceConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            timeout: Duration::from_millis(self.timeout_ms),
            ..SourceConfig::default()
        }
    }
}

fn parse_format(s: &str) -> Result<LoggerFormat, String> {
    s.parse().map_err(|e: flower_observe::LoggerError| e.to_string())
}

fn parse_collector(s: &str) -> Result<CollectorKind, String> {
    s.parse().map_err(|e: flower_core::CoreError| e.to_string())
}
