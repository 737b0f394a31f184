//! Forecast snapshot assembly
//!
//! A snapshot holds the day forecasts of one fetch, in the order the provider
//! sent them, together with the resolved location and the capture time.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::aggregate::DayForecast;
use super::hourly::HourlyGenerationMap;
use crate::data::weatherapi::RawLocation;
use crate::error::ForecastError;

/// Geographic coordinates in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// The location a forecast was resolved to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastLocation {
    /// "name, region, country"
    pub label: String,
    pub coordinates: Coordinates,
    /// IANA timezone identifier
    pub timezone: String,
}

impl ForecastLocation {
    pub fn from_raw(raw: &RawLocation) -> Self {
        Self {
            label: format!("{}, {}, {}", raw.name, raw.region, raw.country),
            coordinates: Coordinates {
                lat: raw.lat,
                lon: raw.lon,
            },
            timezone: raw.tz_id.clone(),
        }
    }
}

/// Day forecasts of one fetch cycle
///
/// Today is the day matching the calendar date in the location's zone at
/// assembly time, tomorrow the one after it. When no such pair exists the
/// first two days are used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotRecord")]
pub struct ForecastSnapshot {
    /// When the snapshot was assembled (not the forecast date)
    pub assembled_at: DateTime<Utc>,
    pub location: ForecastLocation,
    days: Vec<DayForecast>,
    today_index: usize,
}

/// Serialized form of a snapshot, checked before it becomes one
#[derive(Deserialize)]
struct SnapshotRecord {
    assembled_at: DateTime<Utc>,
    location: ForecastLocation,
    days: Vec<DayForecast>,
    #[serde(default)]
    today_index: usize,
}

impl TryFrom<SnapshotRecord> for ForecastSnapshot {
    type Error = ForecastError;

    fn try_from(record: SnapshotRecord) -> Result<Self, Self::Error> {
        if record.days.len() < 2 {
            return Err(ForecastError::InsufficientHorizon(record.days.len()));
        }
        // today must have a following day
        let today_index = if record.today_index + 1 < record.days.len() {
            record.today_index
        } else {
            0
        };
        Ok(Self {
            assembled_at: record.assembled_at,
            location: record.location,
            days: record.days,
            today_index,
        })
    }
}

/// Assemble a snapshot stamped with the current time
pub fn assemble_snapshot(
    days: Vec<DayForecast>,
    location: ForecastLocation,
) -> Result<ForecastSnapshot, ForecastError> {
    assemble_snapshot_at(days, location, Utc::now())
}

/// Assemble a snapshot with an explicit capture time
///
/// Needs at least two days so that today and tomorrow exist.
pub fn assemble_snapshot_at(
    days: Vec<DayForecast>,
    location: ForecastLocation,
    assembled_at: DateTime<Utc>,
) -> Result<ForecastSnapshot, ForecastError> {
    if days.len() < 2 {
        return Err(ForecastError::InsufficientHorizon(days.len()));
    }

    let mut snapshot = ForecastSnapshot {
        assembled_at,
        location,
        days,
        today_index: 0,
    };
    let local_index = snapshot
        .local_today()
        .map(|date| snapshot.days.iter().position(|d| d.date == date));
    match local_index {
        Some(Some(i)) if i + 1 < snapshot.days.len() => snapshot.today_index = i,
        Some(_) => warn!(
            first_day = %snapshot.days[0].date,
            timezone = %snapshot.location.timezone,
            "local calendar date has no today/tomorrow pair, using the first two days"
        ),
        None => warn!(
            timezone = %snapshot.location.timezone,
            "unknown timezone, using the first two days as today and tomorrow"
        ),
    }
    Ok(snapshot)
}

impl ForecastSnapshot {
    /// All days in chronological order
    pub fn days(&self) -> &[DayForecast] {
        &self.days
    }

    pub fn today(&self) -> &DayForecast {
        &self.days[self.today_index]
    }

    pub fn tomorrow(&self) -> &DayForecast {
        &self.days[self.today_index + 1]
    }

    pub fn today_average_generation_percent(&self) -> f64 {
        self.today().average_generation_percent
    }

    pub fn today_hourly_generation_percent(&self) -> &HourlyGenerationMap {
        &self.today().hourly_generation_percent
    }

    pub fn tomorrow_average_generation_percent(&self) -> f64 {
        self.tomorrow().average_generation_percent
    }

    pub fn tomorrow_hourly_generation_percent(&self) -> &HourlyGenerationMap {
        &self.tomorrow().hourly_generation_percent
    }

    /// Look up a day by its calendar date
    pub fn day(&self, date: NaiveDate) -> Option<&DayForecast> {
        self.days.iter().find(|d| d.date == date)
    }

    /// First day whose sunrise is still ahead of `now`
    pub fn next_upcoming_day(&self, now: DateTime<Utc>) -> Option<&DayForecast> {
        self.days.iter().find(|d| now < d.sun_window.sunrise)
    }

    /// Calendar date in the location's zone at assembly time
    pub fn local_today(&self) -> Option<NaiveDate> {
        let tz: Tz = self.location.timezone.parse().ok()?;
        Some(self.assembled_at.with_timezone(&tz).date_naive())
    }

    /// Whether the first day matches the local calendar date at capture time;
    /// `None` when the zone id is unknown
    pub fn starts_on_local_today(&self) -> Option<bool> {
        Some(self.days.first()?.date == self.local_today()?)
    }
}
