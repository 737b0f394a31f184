//! Hourly generation estimate
//!
//! Each hourly sample becomes a relative PV generation percentage derived from
//! cloud cover and visibility. Hours outside the sun window are a hard zero;
//! daylight hours never drop below a small floor for diffuse light.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sun_window::{parse_local_timestamp, SunWindow};
use crate::data::weatherapi::RawHourSample;
use crate::error::ForecastError;

/// Generation percent for hours outside the sun window
pub const NIGHT_PERCENT: f64 = 0.0;

/// Lowest generation percent inside the sun window
pub const DAYLIGHT_FLOOR_PERCENT: f64 = 5.0;

/// Visibility at and above which the air counts as clear
pub const CLEAR_AIR_VISIBILITY_KM: f64 = 10.0;

/// Generation percent per hour, keyed by the hour's instant
pub type HourlyGenerationMap = BTreeMap<DateTime<Utc>, f64>;

/// One parsed hourly observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourSample {
    pub time: DateTime<Utc>,
    /// Cloud cover (0-100)
    pub cloud_percent: f64,
    pub visibility_km: f64,
}

impl HourSample {
    /// Parse a raw sample whose local timestamp carries no offset
    ///
    /// Cloud cover must lie in 0-100 and visibility must be a finite,
    /// non-negative distance.
    pub fn from_raw(raw: &RawHourSample, utc_offset_hours: f64) -> Result<Self, ForecastError> {
        if !(0.0..=100.0).contains(&raw.cloud) {
            return Err(ForecastError::DataShape(format!(
                "cloud cover {} at {} is outside 0-100",
                raw.cloud, raw.time
            )));
        }
        if !raw.vis_km.is_finite() || raw.vis_km < 0.0 {
            return Err(ForecastError::DataShape(format!(
                "invalid visibility {} km at {}",
                raw.vis_km, raw.time
            )));
        }

        Ok(Self {
            time: parse_local_timestamp(&raw.time, utc_offset_hours)?,
            cloud_percent: raw.cloud,
            visibility_km: raw.vis_km,
        })
    }
}

/// Irradiance penalty for haze or fog; grows as visibility approaches zero
pub fn visibility_penalty(visibility_km: f64) -> f64 {
    if visibility_km < CLEAR_AIR_VISIBILITY_KM {
        (100.0 / visibility_km) / 3.0
    } else {
        0.0
    }
}

/// Estimated generation percent (0-100) for one hour
pub fn estimate_hour_generation(sample: &HourSample, window: &SunWindow) -> f64 {
    if !window.contains(sample.time) {
        return NIGHT_PERCENT;
    }

    let percent = 100.0 - sample.cloud_percent - visibility_penalty(sample.visibility_km);
    // NaN (e.g. unknown cloud cover) also ends up on the floor
    if percent >= DAYLIGHT_FLOOR_PERCENT {
        percent
    } else {
        DAYLIGHT_FLOOR_PERCENT
    }
}

/// Estimate every sample of a day against its sun window
///
/// Two samples for the same instant are a `DataShape` error.
pub fn map_day_hours(
    samples: &[HourSample],
    window: &SunWindow,
) -> Result<HourlyGenerationMap, ForecastError> {
    let mut map = HourlyGenerationMap::new();
    for sample in samples {
        match map.entry(sample.time) {
            Entry::Vacant(slot) => {
                slot.insert(estimate_hour_generation(sample, window));
            }
            Entry::Occupied(_) => {
                return Err(ForecastError::DataShape(format!(
                    "duplicate hourly sample at {}",
                    sample.time
                )));
            }
        }
    }
    Ok(map)
}
