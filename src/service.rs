//! Forecast service
//!
//! Ties the provider client, the pipeline and the refresh task together behind
//! one owned object. Each service has its own state, so several locations can
//! be tracked side by side.

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use crate::config::ForecastConfig;
use crate::data::weatherapi::WeatherApiClient;
use crate::error::ForecastError;
use crate::pv::{build_snapshot, ForecastSnapshot};
use crate::refresh::{
    ForecastState, RefreshConfig, RefreshHandle, RefreshMessage, SnapshotSource,
};

/// Crate version reported by [`ForecastService::version`]
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fetches from weatherapi.com with whatever location the config holds now
struct WeatherApiSource {
    client: WeatherApiClient,
    config: RwLock<ForecastConfig>,
}

impl WeatherApiSource {
    fn config(&self) -> ForecastConfig {
        match self.config.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut ForecastConfig)) {
        match self.config.write() {
            Ok(mut config) => apply(&mut config),
            Err(poisoned) => apply(&mut poisoned.into_inner()),
        }
    }
}

impl SnapshotSource for WeatherApiSource {
    fn fetch_snapshot(
        &self,
    ) -> impl Future<Output = Result<ForecastSnapshot, ForecastError>> + Send {
        let config = self.config();
        let client = self.client.clone();
        async move {
            let document = client
                .fetch_document(&config.location, config.days)
                .await?;
            build_snapshot(&document, Utc::now())
        }
    }
}

/// A forecast instance for one location
pub struct ForecastService {
    source: Arc<WeatherApiSource>,
    state: Arc<ForecastState>,
    refresh: Option<RefreshHandle>,
}

impl ForecastService {
    /// Create a service, validating the config before any network work
    pub fn new(config: ForecastConfig) -> Result<Self, ForecastError> {
        config.validate()?;
        let client = WeatherApiClient::new(config.api_key.clone())?;
        Self::with_client(config, client)
    }

    /// Create a service around a preconfigured client
    pub fn with_client(
        config: ForecastConfig,
        client: WeatherApiClient,
    ) -> Result<Self, ForecastError> {
        config.validate()?;
        Ok(Self {
            source: Arc::new(WeatherApiSource {
                client,
                config: RwLock::new(config),
            }),
            state: Arc::new(ForecastState::new()),
            refresh: None,
        })
    }

    pub fn version() -> &'static str {
        VERSION
    }

    /// Current configuration
    pub fn config(&self) -> ForecastConfig {
        self.source.config()
    }

    /// Change the location; applies from the next cycle on
    pub fn set_location(&self, location: impl Into<String>) {
        let location = location.into();
        self.source.update(|config| config.location = location);
    }

    /// Change the refresh interval; applies the next time automation starts
    pub fn set_update_interval(&self, interval: Duration) {
        self.source.update(|config| config.update_interval = interval);
    }

    /// Fetch and transform a forecast right away
    pub async fn forecast_now(&self) -> Result<Arc<ForecastSnapshot>, ForecastError> {
        let snapshot = Arc::new(self.source.fetch_snapshot().await?);
        self.state.store(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// The most recent snapshot from any cycle
    pub fn last_forecast(&self) -> Option<Arc<ForecastSnapshot>> {
        self.state.latest()
    }

    /// Shared state slot, for callers that outlive a refresh handle
    pub fn state(&self) -> Arc<ForecastState> {
        Arc::clone(&self.state)
    }

    pub fn is_automated(&self) -> bool {
        self.refresh.is_some()
    }

    /// Start periodic refreshing
    ///
    /// Returns `false` when the update interval is zero or refreshing is
    /// already running. Must be called inside a tokio runtime.
    pub fn start_automated(&mut self) -> bool {
        let interval = self.config().update_interval;
        if interval.is_zero() || self.refresh.is_some() {
            return false;
        }

        self.refresh = Some(RefreshHandle::spawn(
            RefreshConfig::with_interval(interval),
            Arc::clone(&self.source),
            Arc::clone(&self.state),
        ));
        true
    }

    /// Next message from the refresh task; `None` when not running
    pub async fn next_update(&mut self) -> Option<RefreshMessage> {
        match self.refresh.as_mut() {
            Some(handle) => handle.recv().await,
            None => None,
        }
    }

    /// Stop periodic refreshing; a cycle already running still updates the state
    pub fn stop_automated(&mut self) -> bool {
        if let Some(handle) = self.refresh.take() {
            handle.shutdown();
            info!("automated forecast stopped");
        }
        true
    }
}
