//! pvforecast - photovoltaic generation forecasts from the command line
//!
//! Fetches a multi-day weather forecast, derives hourly and daily PV
//! generation estimates, and prints them as JSON on stdout. Logs go to stderr.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pvforecast::cache::SnapshotStore;
use pvforecast::cli::{render_snapshot, Cli, Command};
use pvforecast::config::ForecastConfig;
use pvforecast::error::ForecastError;
use pvforecast::pv::ForecastSnapshot;
use pvforecast::refresh::RefreshMessage;
use pvforecast::service::ForecastService;

/// Hours a stored snapshot counts as fresh
const SNAPSHOT_TTL_HOURS: u64 = 6;

/// Sets up logging to stderr, filtered by `RUST_LOG` (default `info`)
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Stores the snapshot for `--last`; a failure here never fails the run
fn remember(snapshot: &ForecastSnapshot) {
    match SnapshotStore::new() {
        Some(store) => {
            if let Err(e) = store.save(snapshot, SNAPSHOT_TTL_HOURS) {
                warn!(error = %e, "could not store snapshot");
            }
        }
        None => warn!("no cache directory available, snapshot not stored"),
    }
}

fn print_snapshot(snapshot: &ForecastSnapshot, summary: bool) -> Result<(), ForecastError> {
    println!("{}", render_snapshot(snapshot, summary)?);
    Ok(())
}

fn show_last(summary: bool) -> Result<(), ForecastError> {
    let store = SnapshotStore::new()
        .ok_or_else(|| ForecastError::Cache("no cache directory available".to_string()))?;
    let stored = store
        .load()?
        .ok_or_else(|| ForecastError::Cache("no snapshot stored yet".to_string()))?;

    if stored.is_stale {
        warn!(stored_at = %stored.stored_at, "stored snapshot is stale");
    }
    print_snapshot(&stored.snapshot, summary)
}

async fn run_once(config: ForecastConfig, summary: bool) -> Result<(), ForecastError> {
    let service = ForecastService::new(config)?;
    let snapshot = service.forecast_now().await?;
    remember(&snapshot);
    print_snapshot(&snapshot, summary)
}

async fn run_watch(config: ForecastConfig, summary: bool) -> Result<(), ForecastError> {
    let mut service = ForecastService::new(config)?;
    if !service.start_automated() {
        return Err(ForecastError::Configuration(
            "automated forecast could not be started".to_string(),
        ));
    }

    loop {
        tokio::select! {
            message = service.next_update() => match message {
                Some(RefreshMessage::SnapshotUpdated(snapshot)) => {
                    remember(&snapshot);
                    print_snapshot(&snapshot, summary)?;
                }
                Some(RefreshMessage::CycleFailed(e)) => {
                    error!(error = %e, "forecast refresh failed");
                }
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping");
                service.stop_automated();
                break;
            }
        }
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), ForecastError> {
    match Command::from_cli(&cli)? {
        Command::Last => show_last(cli.summary),
        Command::Once(config) => run_once(config, cli.summary).await,
        Command::Watch(config) => run_watch(config, cli.summary).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
