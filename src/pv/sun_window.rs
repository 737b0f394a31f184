//! Sun-window resolution
//!
//! Converts the provider's 12-hour sunrise/sunset text into absolute instants,
//! using the location's UTC offset as observed at the current instant.

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// Sunrise and sunset of one day as absolute instants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunWindow {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    /// Offset of the location's clock the window was resolved with
    pub utc_offset_seconds: i32,
}

impl SunWindow {
    /// Length of the window in hours (negative for a malformed record)
    pub fn duration_hours(&self) -> f64 {
        (self.sunset - self.sunrise).num_milliseconds() as f64 / 3_600_000.0
    }

    pub fn is_positive(&self) -> bool {
        self.sunrise < self.sunset
    }

    /// The location's clock offset
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_seconds).unwrap_or_else(|| Utc.fix())
    }

    /// Sunrise truncated to the top of its local clock hour
    pub fn sunrise_hour_floor(&self) -> DateTime<Utc> {
        let local = self.sunrise.with_timezone(&self.offset());
        let into_hour = TimeDelta::minutes(i64::from(local.minute()))
            + TimeDelta::seconds(i64::from(local.second()))
            + TimeDelta::nanoseconds(i64::from(local.nanosecond()));
        self.sunrise - into_hour
    }

    /// Whether an instant counts as daylight: from the sunrise hour up to sunset, inclusive
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.sunrise_hour_floor() && instant <= self.sunset
    }
}

/// Parse a 12-hour clock string such as "6:42 AM" into a time of day
///
/// "12 AM" becomes hour 0 and PM hours below 12 gain 12 hours.
pub fn parse_clock_12h(text: &str) -> Result<NaiveTime, ForecastError> {
    let invalid = || ForecastError::DataShape(format!("invalid 12-hour time '{}'", text));

    let upper = text.trim().to_ascii_uppercase();
    let (clock, is_pm) = if let Some(clock) = upper.strip_suffix("AM") {
        (clock, false)
    } else if let Some(clock) = upper.strip_suffix("PM") {
        (clock, true)
    } else {
        return Err(invalid());
    };

    let (hour, minute) = clock.trim().split_once(':').ok_or_else(invalid)?;
    let mut hour: u32 = hour.trim().parse().map_err(|_| invalid())?;
    let minute: u32 = minute.trim().parse().map_err(|_| invalid())?;
    if hour == 0 || hour > 12 {
        return Err(invalid());
    }

    if hour == 12 && !is_pm {
        hour = 0;
    } else if hour < 12 && is_pm {
        hour += 12;
    }

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// Rewrite a 12-hour clock string as bare 24-hour "HH:MM"
pub fn to_24_hour(text: &str) -> Result<String, ForecastError> {
    Ok(parse_clock_12h(text)?.format("%H:%M").to_string())
}

/// UTC offset in (possibly fractional) hours of `tz_id` at the instant `now`
///
/// The offset is taken at the observer's current instant and reused for every
/// forecast day, so a daylight-saving change inside the horizon is not
/// reflected.
pub fn utc_offset_hours(tz_id: &str, now: DateTime<Utc>) -> Result<f64, ForecastError> {
    let tz: Tz = tz_id
        .parse()
        .map_err(|_| ForecastError::DataShape(format!("unknown timezone '{}'", tz_id)))?;
    let offset = tz.offset_from_utc_datetime(&now.naive_utc()).fix();
    Ok(f64::from(offset.local_minus_utc()) / 3600.0)
}

/// Build a fixed offset from signed hours, e.g. 5.5 for UTC+05:30
pub fn fixed_offset(hours: f64) -> Result<FixedOffset, ForecastError> {
    let invalid = || ForecastError::DataShape(format!("invalid UTC offset {} h", hours));
    let seconds = (hours * 3600.0).round();
    if !seconds.is_finite() {
        return Err(invalid());
    }
    FixedOffset::east_opt(seconds as i32).ok_or_else(invalid)
}

/// Parse a forecast calendar date, "YYYY-MM-DD"
pub fn parse_date(text: &str) -> Result<NaiveDate, ForecastError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| ForecastError::DataShape(format!("invalid date '{}'", text)))
}

/// Parse a local "YYYY-MM-DD HH:MM" timestamp at the given offset into UTC
pub fn parse_local_timestamp(
    text: &str,
    offset_hours: f64,
) -> Result<DateTime<Utc>, ForecastError> {
    let trimmed = text.trim();
    let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
        .map_err(|_| ForecastError::DataShape(format!("invalid local timestamp '{}'", text)))?;
    local_to_utc(naive, fixed_offset(offset_hours)?)
}

fn local_to_utc(naive: NaiveDateTime, offset: FixedOffset) -> Result<DateTime<Utc>, ForecastError> {
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ForecastError::DataShape(format!("unrepresentable local time {}", naive)))
}

/// Resolve a day's sunrise/sunset text into a window of absolute instants
///
/// A window with sunset before sunrise is returned as-is; callers decide how
/// to treat it.
pub fn resolve_sun_window(
    date: NaiveDate,
    sunrise_text: &str,
    sunset_text: &str,
    utc_offset_hours: f64,
) -> Result<SunWindow, ForecastError> {
    let offset = fixed_offset(utc_offset_hours)?;
    let sunrise = local_to_utc(date.and_time(parse_clock_12h(sunrise_text)?), offset)?;
    let sunset = local_to_utc(date.and_time(parse_clock_12h(sunset_text)?), offset)?;

    Ok(SunWindow {
        sunrise,
        sunset,
        utc_offset_seconds: offset.local_minus_utc(),
    })
}
