//! Error types shared by the forecast pipeline and its surrounding layer

use thiserror::Error;

/// Errors that can occur while fetching or transforming a forecast
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The provider answered with an `error` object instead of a forecast
    #[error("Upstream error {code}: {message}")]
    Upstream { code: i64, message: String },

    /// A required field is missing or malformed, or an aggregate is undefined
    #[error("Malformed forecast data: {0}")]
    DataShape(String),

    /// Not enough forecast days to expose today and tomorrow
    #[error("Forecast horizon too short: got {0} day(s), need at least 2")]
    InsufficientHorizon(usize),

    /// The configuration cannot be used (e.g. no API key)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The stored snapshot could not be written or read
    #[error("Snapshot cache error: {0}")]
    Cache(String),
}

impl ForecastError {
    /// Whether this error means the forecast data itself was unusable
    pub fn is_data_shape(&self) -> bool {
        matches!(self, ForecastError::DataShape(_))
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(e: serde_json::Error) -> Self {
        ForecastError::DataShape(e.to_string())
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(e: std::io::Error) -> Self {
        ForecastError::Cache(e.to_string())
    }
}
