//! Forecast configuration
//!
//! Holds the settings a forecast instance runs with. Defaults match the
//! library's historical behaviour: Barcelona, three days, no automatic refresh.

use std::time::Duration;

use crate::error::ForecastError;

/// Location used when none is given
pub const DEFAULT_LOCATION: &str = "Barcelona, Catalonia, Spain";

/// Days requested from the provider by default
pub const DEFAULT_FORECAST_DAYS: u32 = 3;

/// Today and tomorrow
pub const MIN_FORECAST_DAYS: u32 = 2;

/// Settings for fetching and refreshing forecasts
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    /// Free-text location query passed to the provider
    pub location: String,
    /// Number of forecast days to request
    pub days: u32,
    /// Interval between automatic refreshes; zero disables them
    pub update_interval: Duration,
    /// weatherapi.com API key
    pub api_key: String,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION.to_string(),
            days: DEFAULT_FORECAST_DAYS,
            update_interval: Duration::ZERO,
            api_key: String::new(),
        }
    }
}

impl ForecastConfig {
    /// Create a config with default settings for the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Whether automatic refreshing is configured
    pub fn automation_enabled(&self) -> bool {
        !self.update_interval.is_zero()
    }

    /// Check the config before any network or transform work
    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.api_key.trim().is_empty() {
            return Err(ForecastError::Configuration(
                "missing weatherapi.com API key".to_string(),
            ));
        }
        if self.location.trim().is_empty() {
            return Err(ForecastError::Configuration("empty location".to_string()));
        }
        if self.days < MIN_FORECAST_DAYS {
            return Err(ForecastError::Configuration(format!(
                "forecast days must be at least {}, got {}",
                MIN_FORECAST_DAYS, self.days
            )));
        }
        Ok(())
    }
}
