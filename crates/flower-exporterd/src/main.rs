//! flower-exporterd: polls Flower instances and serves the resulting gauges on `/metrics`.
//!
//! ```text
//! flower-exporterd --flower http://flower-a:5555 http://flower-b:5555 --addr 0.0.0.0:8888
//! ```

mod cli;

use anyhow::Context;
use clap::Parser;
use flower_api::HttpApi;
use flower_core::Supervisor;
use flower_observe::logger_init;
use flower_prometheus::SeriesRegistry;
use flower_source::HttpSource;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger_init(&cli.logger_config())?;

    let hosts = cli.hosts()?;
    let collectors: Vec<&str> = cli.collectors.iter().map(|c| c.as_str()).collect();
    info!(addr = %cli.addr, hosts = hosts.len(), ?collectors, "starting up");

    let registry = SeriesRegistry::new();
    let source = HttpSource::new(&cli.source_config()).context("building http client")?;
    let mut supervisor = Supervisor::start(
        registry.clone(),
        &hosts,
        &cli.collectors,
        source,
        cli.poll_config(),
    )?;

    let listener = TcpListener::bind(cli.addr.as_str())
        .await
        .with_context(|| format!("binding {}", cli.addr))?;
    let server = flower_api::serve(listener, HttpApi::new(registry).router());

    tokio::select! {
        _ = shutdown_signal() => {
            info!("shutting down");
        }
        res = server => {
            res.context("metrics server stopped")?;
        }
        _ = async {
            while supervisor.next_exit().await.is_some() {}
        } => {
            warn!("every poll loop has terminated, exiting");
        }
    }

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let Ok(mut term) = signal(SignalKind::terminate()) else {
        let _ = tokio::signal::ctrl_c().await;
        return;
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
