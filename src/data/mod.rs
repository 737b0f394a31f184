//! External forecast data
//!
//! Typed records of the provider's forecast document and the client that
//! fetches it.

pub mod weatherapi;

pub use weatherapi::{
    parse_document, ForecastDocument, RawAstro, RawDayForecast, RawForecast, RawHourSample,
    RawLocation, WeatherApiClient,
};
