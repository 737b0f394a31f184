//! weatherapi.com forecast client
//!
//! This module fetches the multi-day forecast document from weatherapi.com and
//! parses it into strongly-typed records. Field validation happens here so the
//! pipeline never sees a half-populated document.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ForecastError;

/// Base URL for the weatherapi.com REST API
const WEATHER_API_BASE_URL: &str = "http://api.weatherapi.com/v1";

/// Request timeout for forecast fetches
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Complete forecast document as returned by `forecast.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDocument {
    /// Location the forecast was resolved to
    pub location: RawLocation,
    /// The per-day forecast block
    pub forecast: RawForecast,
}

/// Location payload of the forecast document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLocation {
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    /// IANA timezone identifier, e.g. "Europe/Madrid"
    pub tz_id: String,
}

/// Wrapper around the list of forecast days
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawForecast {
    pub forecastday: Vec<RawDayForecast>,
}

/// One forecast day, in the location's local calendar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDayForecast {
    /// Calendar date, "YYYY-MM-DD"
    pub date: String,
    pub astro: RawAstro,
    /// Hourly samples, one per local hour
    pub hour: Vec<RawHourSample>,
}

/// Sunrise and sunset in 12-hour clock text, e.g. "06:42 AM"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAstro {
    pub sunrise: String,
    pub sunset: String,
}

/// One hourly observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHourSample {
    /// Local time without offset, "YYYY-MM-DD HH:MM"
    pub time: String,
    /// Cloud cover percentage (0-100)
    pub cloud: f64,
    /// Visibility in kilometers
    pub vis_km: f64,
}

/// Error body the provider sends instead of a forecast
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Parse a forecast document, surfacing provider errors first
///
/// # Returns
/// * `Ok(ForecastDocument)` - the typed document
/// * `Err(ForecastError::Upstream)` - the root carries an `error` object
/// * `Err(ForecastError::DataShape)` - the JSON is malformed or incomplete
pub fn parse_document(text: &str) -> Result<ForecastDocument, ForecastError> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    if let Some(error) = value.get("error") {
        let body: ApiErrorBody = serde_json::from_value(error.clone())?;
        return Err(ForecastError::Upstream {
            code: body.code,
            message: body.message,
        });
    }

    Ok(serde_json::from_value(value)?)
}

/// Client for fetching forecasts from weatherapi.com
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherApiClient {
    /// Create a new client for the given API key
    ///
    /// Fails with `ForecastError::Configuration` when the key is empty, before
    /// any network work happens.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ForecastError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ForecastError::Configuration(
                "missing weatherapi.com API key".to_string(),
            ));
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: WEATHER_API_BASE_URL.to_string(),
            api_key,
        })
    }

    /// Point the client at a different API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch and parse the forecast document for a location
    ///
    /// # Arguments
    /// * `location` - free-text location query, e.g. "London"
    /// * `days` - number of forecast days to request
    pub async fn fetch_document(
        &self,
        location: &str,
        days: u32,
    ) -> Result<ForecastDocument, ForecastError> {
        let url = format!("{}/forecast.json", self.base_url);
        let days = days.to_string();

        info!(location, days = %days, "fetching forecast");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", location),
                ("days", days.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        // The provider reports failures in the body, so parse regardless of status
        let status = response.status();
        let text = response.text().await?;
        debug!(%status, bytes = text.len(), "forecast response received");

        parse_document(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{clear_day_json, document_json};

    #[test]
    fn test_parse_valid_document() {
        let day = clear_day_json("2024-06-21", "06:00 AM", "08:00 PM");
        let json = document_json("Etc/UTC", vec![day]);
        let doc = parse_document(&json.to_string()).expect("Should parse");

        assert_eq!(doc.location.name, "Barcelona");
        assert_eq!(doc.location.tz_id, "Etc/UTC");
        assert_eq!(doc.forecast.forecastday.len(), 1);
        assert_eq!(doc.forecast.forecastday[0].hour.len(), 24);
        assert_eq!(doc.forecast.forecastday[0].astro.sunrise, "06:00 AM");
    }

    #[test]
    fn test_parse_upstream_error() {
        let json = r#"{"error":{"code":2006,"message":"API key is invalid."}}"#;
        match parse_document(json) {
            Err(ForecastError::Upstream { code, message }) => {
                assert_eq!(code, 2006);
                assert_eq!(message, "API key is invalid.");
            }
            other => panic!("Expected upstream error, got {:?}", other),
        }
    }

    #[test]
    fn test_upstream_error_wins_over_partial_document() {
        let json =
            r#"{"error":{"code":1006,"message":"No matching location found."},"location":{}}"#;
        assert!(matches!(
            parse_document(json),
            Err(ForecastError::Upstream { code: 1006, .. })
        ));
    }

    #[test]
    fn test_parse_missing_field_is_data_shape() {
        let day = clear_day_json("2024-06-21", "06:00 AM", "08:00 PM");
        let mut json = document_json("Etc/UTC", vec![day]);
        json["forecast"]["forecastday"][0]
            .as_object_mut()
            .expect("day object")
            .remove("astro");

        let err = parse_document(&json.to_string()).unwrap_err();
        assert!(err.is_data_shape(), "got {:?}", err);
    }

    #[test]
    fn test_parse_invalid_json_is_data_shape() {
        let err = parse_document("not json").unwrap_err();
        assert!(err.is_data_shape());
    }

    #[test]
    fn test_client_rejects_empty_api_key() {
        let result = WeatherApiClient::new("  ");
        assert!(matches!(result, Err(ForecastError::Configuration(_))));
    }

    #[test]
    fn test_client_with_base_url() {
        let client = WeatherApiClient::new("key")
            .expect("Should build")
            .with_base_url("http://localhost:9999/v1");
        assert_eq!(client.base_url, "http://localhost:9999/v1");
    }
}
