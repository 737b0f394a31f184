//! Forecast documents for unit tests

use serde_json::{json, Value};

/// A forecast day whose hourly samples come from `sample(hour) -> (cloud, vis_km)`
pub fn day_json(
    date: &str,
    sunrise: &str,
    sunset: &str,
    sample: impl Fn(u32) -> (f64, f64),
) -> Value {
    let hours: Vec<Value> = (0..24)
        .map(|h| {
            let (cloud, vis_km) = sample(h);
            json!({
                "time_epoch": 0,
                "time": format!("{} {:02}:00", date, h),
                "cloud": cloud,
                "vis_km": vis_km,
            })
        })
        .collect();

    json!({
        "date": date,
        "astro": { "sunrise": sunrise, "sunset": sunset, "moon_phase": "Full Moon" },
        "hour": hours,
    })
}

/// A cloudless day with clear-air visibility
pub fn clear_day_json(date: &str, sunrise: &str, sunset: &str) -> Value {
    day_json(date, sunrise, sunset, |_| (0.0, 10.0))
}

/// A full forecast document for Barcelona in the given timezone
pub fn document_json(tz_id: &str, days: Vec<Value>) -> Value {
    json!({
        "location": {
            "name": "Barcelona",
            "region": "Catalonia",
            "country": "Spain",
            "lat": 41.38,
            "lon": 2.18,
            "tz_id": tz_id,
            "localtime": "2024-06-21 10:00",
        },
        "current": { "cloud": 0 },
        "forecast": { "forecastday": days },
    })
}

/// A two-day clear-sky snapshot for Barcelona in UTC
pub fn sample_snapshot() -> crate::pv::ForecastSnapshot {
    use chrono::TimeZone;

    let json = document_json(
        "Etc/UTC",
        vec![
            clear_day_json("2024-06-21", "06:00 AM", "08:00 PM"),
            clear_day_json("2024-06-22", "06:01 AM", "07:59 PM"),
        ],
    );
    let document = crate::data::weatherapi::parse_document(&json.to_string())
        .expect("fixture document parses");
    let now = chrono::Utc.with_ymd_and_hms(2024, 6, 21, 3, 0, 0).unwrap();
    crate::pv::build_snapshot(&document, now).expect("fixture snapshot builds")
}
