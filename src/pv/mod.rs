//! PV generation pipeline
//!
//! Turns a typed forecast document into a [`ForecastSnapshot`]:
//! sun window per day, hourly generation estimates, day aggregates, and the
//! assembled snapshot. Everything here is pure apart from reading the clock
//! value passed in by the caller.

pub mod aggregate;
pub mod hourly;
pub mod snapshot;
pub mod sun_window;

pub use aggregate::{aggregate_day, DayAggregate, DayForecast};
pub use hourly::{estimate_hour_generation, map_day_hours, HourSample, HourlyGenerationMap};
pub use snapshot::{
    assemble_snapshot, assemble_snapshot_at, Coordinates, ForecastLocation, ForecastSnapshot,
};
pub use sun_window::{resolve_sun_window, to_24_hour, utc_offset_hours, SunWindow};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::data::weatherapi::{ForecastDocument, RawDayForecast};
use crate::error::ForecastError;

/// Hourly samples a forecast day must carry
pub const HOURS_PER_DAY: usize = 24;

/// Build one day forecast from its raw record
pub fn build_day_forecast(
    raw: &RawDayForecast,
    utc_offset_hours: f64,
) -> Result<DayForecast, ForecastError> {
    let date = sun_window::parse_date(&raw.date)?;
    let window = resolve_sun_window(date, &raw.astro.sunrise, &raw.astro.sunset, utc_offset_hours)?;
    if !window.is_positive() {
        return Err(ForecastError::DataShape(format!(
            "sunset {} is not after sunrise {} on {}",
            window.sunset, window.sunrise, date
        )));
    }

    if raw.hour.len() < HOURS_PER_DAY {
        return Err(ForecastError::DataShape(format!(
            "{} has {} hourly samples, expected {}",
            date,
            raw.hour.len(),
            HOURS_PER_DAY
        )));
    }

    let samples = raw
        .hour
        .iter()
        .map(|h| HourSample::from_raw(h, utc_offset_hours))
        .collect::<Result<Vec<_>, _>>()?;
    let hourly = map_day_hours(&samples, &window)?;

    Ok(DayForecast::new(date, window, hourly))
}

/// Run the whole pipeline over a forecast document
///
/// The location's UTC offset is taken at `now` and applied to every day.
/// Stops at the first malformed day.
pub fn build_snapshot(
    document: &ForecastDocument,
    now: DateTime<Utc>,
) -> Result<ForecastSnapshot, ForecastError> {
    let location = ForecastLocation::from_raw(&document.location);
    let offset_hours = utc_offset_hours(&location.timezone, now)?;
    debug!(timezone = %location.timezone, offset_hours, "resolved location offset");

    let days = document
        .forecast
        .forecastday
        .iter()
        .map(|raw| build_day_forecast(raw, offset_hours))
        .collect::<Result<Vec<_>, _>>()?;

    for day in &days {
        debug!(
            date = %day.date,
            average = day.average_generation_percent,
            peak_average = day.peak_average_generation_percent,
            sun_hours = day.total_sun_hours,
            "day forecast"
        );
    }

    assemble_snapshot_at(days, location, now)
}
