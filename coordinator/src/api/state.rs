//! Application state shared across handlers.

use std::sync::Arc;

use countrycache_store::CacheStore;

use crate::config::CacheConfig;
use crate::coordinator::RefreshCoordinator;
use crate::metrics::SharedMetrics;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<RefreshCoordinator>,
    pub store: CacheStore,
    pub metrics: SharedMetrics,
    pub config: Arc<CacheConfig>,
}

impl AppState {
    /// Build handler state around a coordinator. Reads go to the
    /// coordinator's store and metrics.
    pub fn new(coordinator: RefreshCoordinator, config: CacheConfig) -> Self {
        Self {
            store: coordinator.store().clone(),
            metrics: coordinator.metrics().clone(),
            coordinator: Arc::new(coordinator),
            config: Arc::new(config),
        }
    }
}
