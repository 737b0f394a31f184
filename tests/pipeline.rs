//! End-to-end tests of the forecast pipeline through the public API

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};

use pvforecast::data::parse_document;
use pvforecast::pv::{
    assemble_snapshot, build_snapshot, to_24_hour, utc_offset_hours, Coordinates, ForecastLocation,
};
use pvforecast::ForecastError;

fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn day(date: &str, sunrise: &str, sunset: &str, sample: impl Fn(u32) -> (f64, f64)) -> Value {
    let hours: Vec<Value> = (0..24)
        .map(|h| {
            let (cloud, vis_km) = sample(h);
            json!({ "time": format!("{} {:02}:00", date, h), "cloud": cloud, "vis_km": vis_km })
        })
        .collect();
    json!({ "date": date, "astro": { "sunrise": sunrise, "sunset": sunset }, "hour": hours })
}

fn document(tz_id: &str, days: Vec<Value>) -> String {
    json!({
        "location": {
            "name": "London",
            "region": "City of London, Greater London",
            "country": "United Kingdom",
            "lat": 51.52,
            "lon": -0.11,
            "tz_id": tz_id,
        },
        "forecast": { "forecastday": days },
    })
    .to_string()
}

#[test]
fn test_clear_fourteen_hour_day() {
    let text = document(
        "UTC",
        vec![
            day("2024-06-21", "06:00 AM", "08:00 PM", |_| (0.0, 10.0)),
            day("2024-06-22", "06:00 AM", "08:00 PM", |_| (0.0, 25.0)),
        ],
    );
    let snapshot = build_snapshot(&parse_document(&text).unwrap(), utc(2024, 6, 21, 1)).unwrap();

    let today = snapshot.today();
    assert_eq!(today.total_sun_hours, 14.0);
    assert_eq!(today.average_generation_percent, 100.0);
    assert_eq!(today.peak_average_generation_percent, 100.0);
    for (hour, value) in &today.hourly_generation_percent {
        if today.sun_window.contains(*hour) {
            assert_eq!(*value, 100.0, "daylight hour {}", hour);
        } else {
            assert_eq!(*value, 0.0, "night hour {}", hour);
        }
    }
    assert_eq!(
        snapshot.location.label,
        "London, City of London, Greater London, United Kingdom"
    );
}

#[test]
fn test_overcast_daylight_hour_is_floored() {
    // Full cloud at 12:00 with clear visibility, clear sky otherwise
    let text = document(
        "UTC",
        vec![
            day("2024-06-21", "06:00 AM", "08:00 PM", |h| {
                if h == 12 {
                    (100.0, 20.0)
                } else {
                    (0.0, 20.0)
                }
            }),
            day("2024-06-22", "06:00 AM", "08:00 PM", |_| (0.0, 20.0)),
        ],
    );
    let snapshot = build_snapshot(&parse_document(&text).unwrap(), utc(2024, 6, 21, 1)).unwrap();

    let hourly = snapshot.today_hourly_generation_percent();
    assert_eq!(hourly[&utc(2024, 6, 21, 12)], 5.0);
    assert_eq!(hourly[&utc(2024, 6, 21, 11)], 100.0);
}

#[test]
fn test_night_hours_are_zero_whatever_the_weather() {
    let text = document(
        "UTC",
        vec![
            day("2024-12-21", "08:04 AM", "03:54 PM", |_| (0.0, 10.0)),
            day("2024-12-22", "08:05 AM", "03:55 PM", |_| (100.0, 0.5)),
        ],
    );
    let snapshot = build_snapshot(&parse_document(&text).unwrap(), utc(2024, 12, 21, 1)).unwrap();

    for day in snapshot.days() {
        for (hour, value) in &day.hourly_generation_percent {
            if *hour < day.sun_window.sunrise_hour_floor() || *hour > day.sun_window.sunset {
                assert_eq!(*value, 0.0);
            } else {
                assert!((5.0..=100.0).contains(value));
            }
        }
    }
    // 08:00 is inside the window since sunrise is floored to the hour
    assert_eq!(snapshot.today_hourly_generation_percent()[&utc(2024, 12, 21, 8)], 100.0);
    assert_eq!(snapshot.tomorrow_average_generation_percent(), 5.0);
}

#[test]
fn test_location_offset_shifts_sun_window() {
    let text = document(
        "Europe/London",
        vec![
            day("2024-06-21", "04:43 AM", "09:21 PM", |_| (0.0, 10.0)),
            day("2024-06-22", "04:43 AM", "09:21 PM", |_| (0.0, 10.0)),
        ],
    );
    let now = utc(2024, 6, 21, 1);
    assert_eq!(utc_offset_hours("Europe/London", now).unwrap(), 1.0);

    let snapshot = build_snapshot(&parse_document(&text).unwrap(), now).unwrap();
    let window = snapshot.today().sun_window;
    assert_eq!(window.sunrise, Utc.with_ymd_and_hms(2024, 6, 21, 3, 43, 0).unwrap());
    assert_eq!(window.sunset, Utc.with_ymd_and_hms(2024, 6, 21, 20, 21, 0).unwrap());
}

#[test]
fn test_short_horizon_is_rejected() {
    let one_day = document("UTC", vec![day("2024-06-21", "06:00 AM", "08:00 PM", |_| (0.0, 10.0))]);
    let err = build_snapshot(&parse_document(&one_day).unwrap(), utc(2024, 6, 21, 1)).unwrap_err();
    assert!(matches!(err, ForecastError::InsufficientHorizon(1)));

    let no_days = document("UTC", vec![]);
    let err = build_snapshot(&parse_document(&no_days).unwrap(), utc(2024, 6, 21, 1)).unwrap_err();
    assert!(matches!(err, ForecastError::InsufficientHorizon(0)));

    let nowhere = ForecastLocation {
        label: "Nowhere".to_string(),
        coordinates: Coordinates { lat: 0.0, lon: 0.0 },
        timezone: "UTC".to_string(),
    };
    let err = assemble_snapshot(vec![], nowhere).unwrap_err();
    assert!(matches!(err, ForecastError::InsufficientHorizon(0)));
}

#[test]
fn test_next_upcoming_day() {
    let text = document(
        "UTC",
        vec![
            day("2024-06-21", "06:00 AM", "08:00 PM", |_| (0.0, 10.0)),
            day("2024-06-22", "06:00 AM", "08:00 PM", |_| (50.0, 10.0)),
            day("2024-06-23", "06:00 AM", "08:00 PM", |_| (90.0, 10.0)),
        ],
    );
    let snapshot = build_snapshot(&parse_document(&text).unwrap(), utc(2024, 6, 21, 1)).unwrap();

    let next = snapshot.next_upcoming_day(utc(2024, 6, 21, 13)).unwrap();
    assert_eq!(next.date, NaiveDate::from_ymd_opt(2024, 6, 22).unwrap());
    assert_eq!(next.average_generation_percent, 50.0);
    assert!(snapshot.next_upcoming_day(utc(2024, 6, 23, 7)).is_none());
}

#[test]
fn test_upstream_error_short_circuits() {
    let text = json!({ "error": { "code": 1006, "message": "No matching location found." } })
        .to_string();
    match parse_document(&text) {
        Err(ForecastError::Upstream { code, message }) => {
            assert_eq!(code, 1006);
            assert_eq!(message, "No matching location found.");
        }
        other => panic!("Expected upstream error, got {:?}", other),
    }
}

#[test]
fn test_missing_hours_fail_fast() {
    let mut short = day("2024-06-21", "06:00 AM", "08:00 PM", |_| (0.0, 10.0));
    short["hour"].as_array_mut().unwrap().truncate(20);
    let second = day("2024-06-22", "06:00 AM", "08:00 PM", |_| (0.0, 10.0));
    let text = document("UTC", vec![short, second]);

    let err = build_snapshot(&parse_document(&text).unwrap(), utc(2024, 6, 21, 1)).unwrap_err();
    assert!(err.is_data_shape());
}

#[test]
fn test_twelve_hour_conversion() {
    assert_eq!(to_24_hour("12:00 AM").unwrap(), "00:00");
    assert_eq!(to_24_hour("12:30 PM").unwrap(), "12:30");
    assert_eq!(to_24_hour("07:59 PM").unwrap(), "19:59");
    assert!(to_24_hour("25:00 PM").is_err());
}

#[test]
fn test_out_of_range_weather_fails_fast() {
    let second = day("2024-06-22", "06:00 AM", "08:00 PM", |_| (0.0, 10.0));

    let negative_cloud = day("2024-06-21", "06:00 AM", "08:00 PM", |h| {
        if h == 12 {
            (-10.0, 10.0)
        } else {
            (0.0, 10.0)
        }
    });
    let text = document("UTC", vec![negative_cloud, second.clone()]);
    let err = build_snapshot(&parse_document(&text).unwrap(), utc(2024, 6, 21, 1)).unwrap_err();
    assert!(err.is_data_shape(), "{}", err);

    let negative_visibility = day("2024-06-21", "06:00 AM", "08:00 PM", |_| (0.0, -1.0));
    let text = document("UTC", vec![negative_visibility, second]);
    let err = build_snapshot(&parse_document(&text).unwrap(), utc(2024, 6, 21, 1)).unwrap_err();
    assert!(err.is_data_shape(), "{}", err);
}

#[test]
fn test_duplicate_hour_fails_fast() {
    let mut doubled = day("2024-06-21", "06:00 AM", "08:00 PM", |_| (0.0, 10.0));
    let extra = doubled["hour"][12].clone();
    doubled["hour"].as_array_mut().unwrap().push(extra);
    let second = day("2024-06-22", "06:00 AM", "08:00 PM", |_| (0.0, 10.0));
    let text = document("UTC", vec![doubled, second]);

    let err = build_snapshot(&parse_document(&text).unwrap(), utc(2024, 6, 21, 1)).unwrap_err();
    assert!(err.to_string().contains("duplicate"), "{}", err);
}
