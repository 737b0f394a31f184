//! pvforecast library
//!
//! Derives relative photovoltaic generation estimates (0-100 %) per hour and
//! per day from weatherapi.com forecasts. The [`pv`] module holds the pure
//! transformation pipeline; [`service`] and [`refresh`] wrap it with fetching
//! and periodic refresh.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod pv;
pub mod refresh;
mod serialize_nan;
pub mod service;

#[cfg(test)]
mod test_fixtures;

pub use config::ForecastConfig;
pub use error::ForecastError;
pub use pv::{build_snapshot, DayForecast, ForecastLocation, ForecastSnapshot, SunWindow};
pub use service::ForecastService;
