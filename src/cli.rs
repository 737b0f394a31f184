//! Command-line interface parsing for pvforecast
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the command the binary runs: a one-shot forecast, a refreshing watch loop,
//! or a dump of the last stored snapshot.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use serde::Serialize;

use crate::config::{ForecastConfig, DEFAULT_FORECAST_DAYS, DEFAULT_LOCATION};
use crate::error::ForecastError;
use crate::pv::{DayForecast, ForecastSnapshot};

/// pvforecast - photovoltaic generation estimates from weather forecasts
#[derive(Parser, Debug)]
#[command(name = "pvforecast")]
#[command(about = "Photovoltaic generation forecast from weatherapi.com data")]
#[command(version)]
pub struct Cli {
    /// Location to forecast, e.g. "London" or "41.38,2.18"
    #[arg(long, short, default_value = DEFAULT_LOCATION)]
    pub location: String,

    /// Number of forecast days (at least 2)
    #[arg(long, short, default_value_t = DEFAULT_FORECAST_DAYS)]
    pub days: u32,

    /// weatherapi.com API key
    #[arg(long, env = "PVFORECAST_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Keep running and refresh the forecast every SECONDS
    #[arg(long, value_name = "SECONDS")]
    pub watch: Option<u64>,

    /// Print the last stored snapshot instead of fetching
    #[arg(long, conflicts_with = "watch")]
    pub last: bool,

    /// Print a per-day summary instead of the full snapshot
    #[arg(long)]
    pub summary: bool,
}

/// What the binary should do
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Show the stored snapshot
    Last,
    /// Fetch once and print
    Once(ForecastConfig),
    /// Fetch on an interval until interrupted
    Watch(ForecastConfig),
}

impl Command {
    /// Creates a Command from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Command)` with a validated config for fetching commands
    /// * `Err(ForecastError::Configuration)` if the arguments can't be used
    pub fn from_cli(cli: &Cli) -> Result<Self, ForecastError> {
        if cli.last {
            return Ok(Command::Last);
        }

        let mut config = ForecastConfig::new(cli.api_key.clone().unwrap_or_default())
            .with_location(cli.location.clone())
            .with_days(cli.days);

        let command = match cli.watch {
            None => Command::Once(config),
            Some(0) => {
                return Err(ForecastError::Configuration(
                    "watch interval must be at least 1 second".to_string(),
                ))
            }
            Some(seconds) => {
                config = config.with_update_interval(Duration::from_secs(seconds));
                Command::Watch(config)
            }
        };

        match &command {
            Command::Once(config) | Command::Watch(config) => config.validate()?,
            Command::Last => {}
        }
        Ok(command)
    }
}

/// Compact view of one forecast day
#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub total_sun_hours: f64,
    pub sunlight_hours: usize,
    pub average_generation_percent: Option<f64>,
    pub peak_average_generation_percent: Option<f64>,
}

impl DaySummary {
    pub fn from_day(day: &DayForecast) -> Self {
        let defined = |v: f64| if v.is_finite() { Some(v) } else { None };
        Self {
            date: day.date,
            sunrise: day.sun_window.sunrise,
            sunset: day.sun_window.sunset,
            total_sun_hours: day.total_sun_hours,
            sunlight_hours: day.sunlight_hours(),
            average_generation_percent: defined(day.average_generation_percent),
            peak_average_generation_percent: defined(day.peak_average_generation_percent),
        }
    }
}

/// Summary of a whole snapshot
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub location: String,
    pub assembled_at: DateTime<Utc>,
    pub days: Vec<DaySummary>,
}

impl SnapshotSummary {
    pub fn from_snapshot(snapshot: &ForecastSnapshot) -> Self {
        Self {
            location: snapshot.location.label.clone(),
            assembled_at: snapshot.assembled_at,
            days: snapshot.days().iter().map(DaySummary::from_day).collect(),
        }
    }
}

/// Render a snapshot as pretty JSON, full or summarized
pub fn render_snapshot(
    snapshot: &ForecastSnapshot,
    summary: bool,
) -> Result<String, ForecastError> {
    let json = if summary {
        serde_json::to_string_pretty(&SnapshotSummary::from_snapshot(snapshot))?
    } else {
        serde_json::to_string_pretty(snapshot)?
    };
    Ok(json)
}
