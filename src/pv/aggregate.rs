//! Day aggregation
//!
//! Reduces a day's hourly estimates to a daily average, the length of the sun
//! window, and the average over the peak block of hours centred on midday.
//! Undefined results (no daylight, peak block longer than the day) stay NaN.

use std::ops::Range;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::hourly::{HourlyGenerationMap, DAYLIGHT_FLOOR_PERCENT};
use super::sun_window::SunWindow;
use crate::error::ForecastError;
use crate::serialize_nan;

/// Significant figures kept on every daily figure
pub const SIGNIFICANT_DIGITS: usize = 4;

/// Hours of daylight per hour of peak sun
pub const PEAK_HOURS_DIVISOR: f64 = 2.5;

/// Enough mantissa digits to print any `f64` exactly
const EXACT_DIGITS: usize = 800;

/// Round to `digits` significant figures; NaN and infinities pass through
///
/// Rounds the exact decimal value of `value`, with ties going away from
/// zero, the same way `Number.prototype.toPrecision` does.
pub fn round_significant(value: f64, digits: usize) -> f64 {
    if !value.is_finite() || value == 0.0 || digits == 0 {
        return value;
    }

    let exact = format!("{:.*e}", EXACT_DIGITS, value.abs());
    let Some((mantissa, exponent)) = exact.split_once('e') else {
        return value;
    };
    let Ok(mut exponent) = exponent.parse::<i32>() else {
        return value;
    };

    let mut kept: Vec<u8> = mantissa
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect();
    let round_up = kept.get(digits).is_some_and(|d| *d >= 5);
    kept.truncate(digits);

    if round_up {
        match kept.iter().rposition(|d| *d != 9) {
            Some(i) => {
                kept[i] += 1;
                kept[i + 1..].iter_mut().for_each(|d| *d = 0);
            }
            None => {
                // 9.99.. carries into a new leading digit
                kept.iter_mut().for_each(|d| *d = 0);
                kept[0] = 1;
                exponent += 1;
            }
        }
    }

    let text: String = kept.iter().map(|d| char::from(b'0' + d)).collect();
    let scale = exponent - (digits as i32 - 1);
    match format!("{}e{}", text, scale).parse::<f64>() {
        Ok(rounded) => rounded.copysign(value),
        Err(_) => value,
    }
}

/// Length of the peak block for a day with `total_sun_hours` of daylight
pub fn peak_hours_number(total_sun_hours: f64) -> usize {
    if !total_sun_hours.is_finite() || total_sun_hours <= 0.0 {
        return 0;
    }
    (total_sun_hours / PEAK_HOURS_DIVISOR).floor() as usize
}

/// Range of the peak block within `len` daylight hours
///
/// The block is centred on the middle daylight hour and shifted to stay in
/// bounds. `None` when the block is empty or longer than the day.
pub fn peak_slice(len: usize, peak_hours: usize) -> Option<Range<usize>> {
    if peak_hours == 0 || peak_hours > len {
        return None;
    }

    let middle = (len / 2) as f64;
    let start = (middle - peak_hours as f64 / 2.0).floor() as i64;
    let start = start.clamp(0, (len - peak_hours) as i64) as usize;
    Some(start..start + peak_hours)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Daily figures derived from an hourly map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayAggregate {
    /// Mean of daylight hours (values at or above the floor)
    pub average_generation_percent: f64,
    pub total_sun_hours: f64,
    /// Number of hours in the peak block
    pub peak_hours: usize,
    pub peak_average_generation_percent: f64,
}

/// Aggregate a day's hourly estimates
pub fn aggregate_day(hourly: &HourlyGenerationMap, window: &SunWindow) -> DayAggregate {
    let total_sun_hours = round_significant(window.duration_hours(), SIGNIFICANT_DIGITS);

    let daylight: Vec<f64> = hourly
        .values()
        .copied()
        .filter(|v| *v >= DAYLIGHT_FLOOR_PERCENT)
        .collect();
    let average_generation_percent = round_significant(mean(&daylight), SIGNIFICANT_DIGITS);

    let sun_time_hours: Vec<f64> = hourly.values().copied().filter(|v| *v > 0.0).collect();
    let peak_hours = peak_hours_number(total_sun_hours);
    let peak_average = match peak_slice(sun_time_hours.len(), peak_hours) {
        Some(range) => mean(&sun_time_hours[range]),
        None => f64::NAN,
    };

    DayAggregate {
        average_generation_percent,
        total_sun_hours,
        peak_hours,
        peak_average_generation_percent: round_significant(peak_average, SIGNIFICANT_DIGITS),
    }
}

/// One forecast day with its hourly estimates and daily figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub date: NaiveDate,
    pub sun_window: SunWindow,
    pub hourly_generation_percent: HourlyGenerationMap,
    #[serde(with = "serialize_nan")]
    pub average_generation_percent: f64,
    #[serde(with = "serialize_nan")]
    pub total_sun_hours: f64,
    #[serde(with = "serialize_nan")]
    pub peak_average_generation_percent: f64,
}

impl DayForecast {
    pub fn new(date: NaiveDate, sun_window: SunWindow, hourly: HourlyGenerationMap) -> Self {
        let aggregate = aggregate_day(&hourly, &sun_window);
        Self {
            date,
            sun_window,
            hourly_generation_percent: hourly,
            average_generation_percent: aggregate.average_generation_percent,
            total_sun_hours: aggregate.total_sun_hours,
            peak_average_generation_percent: aggregate.peak_average_generation_percent,
        }
    }

    /// Number of hours with any daylight generation
    pub fn sunlight_hours(&self) -> usize {
        self.hourly_generation_percent.values().filter(|v| **v > 0.0).count()
    }

    /// Fails with `DataShape` if any daily figure is undefined
    pub fn validate(&self) -> Result<(), ForecastError> {
        let figures = [
            ("average generation", self.average_generation_percent),
            ("total sun hours", self.total_sun_hours),
            ("peak average generation", self.peak_average_generation_percent),
        ];
        for (name, value) in figures {
            if !value.is_finite() {
                return Err(ForecastError::DataShape(format!(
                    "{} undefined for {}",
                    name, self.date
                )));
            }
        }
        Ok(())
    }
}
