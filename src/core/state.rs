//! Application state: configuration plus the shared HTTP client.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::core::{AppConfig, TransformMode};
use crate::processing::{
    BatchCoordinator, CompressStrategy, ConvertStrategy, HttpClient, RemoveBackgroundStrategy,
    ReqwestHttpClient, StrategySet,
};
use crate::utils::TransportError;

/// Holds the configuration and the HTTP client every remote strategy shares.
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    http: Arc<dyn HttpClient>,
}

impl AppState {
    /// Creates a new application state backed by a real HTTP client.
    pub fn new(config: AppConfig) -> Result<Self, TransportError> {
        let timeout = config.http.timeout_secs.map(Duration::from_secs);
        let http = ReqwestHttpClient::with_timeout(timeout)?;
        debug!("HTTP client initialized (timeout: {:?})", timeout);
        Ok(Self::with_client(config, Arc::new(http)))
    }

    /// Creates a state around an existing client, e.g. a mock.
    pub fn with_client(config: AppConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            config: Arc::new(config),
            http,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Builds one strategy per mode from the configuration.
    pub fn create_strategies(&self) -> StrategySet {
        StrategySet::new(
            Arc::new(CompressStrategy::from_config(&self.config.compress)),
            Arc::new(ConvertStrategy::new(Arc::clone(&self.http), &self.config.convert)),
            Arc::new(RemoveBackgroundStrategy::new(
                Arc::clone(&self.http),
                &self.config.remove_background,
            )),
        )
    }

    /// Creates an empty batch bound to `mode`.
    pub fn create_coordinator(&self, mode: TransformMode) -> BatchCoordinator {
        BatchCoordinator::new(mode, self.create_strategies(), self.config.validators())
    }
}
