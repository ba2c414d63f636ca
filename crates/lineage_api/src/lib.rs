//! Lineage REST API
//!
//! HTTP surface over the version-history store and the bundle register of
//! `lineage_core`.
//!
//! # Architecture
//!
//! This crate lives in the HTTP layer and handles:
//! - HTTP request/response translation
//! - Bearer token authentication and write authorization
//! - Error mapping from domain to HTTP
//! - Routing, metrics and server configuration
//!
//! The core never sees principals or HTTP types. The dependency flows
//! HTTP API → core, never the reverse.

use std::sync::Arc;

use lineage_core::{BundleRegister, ItemCatalog, VersionHistoryStore, VersioningSettings};

pub mod authorization;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod translation;

#[cfg(test)]
mod test_support;

pub use authorization::{ConfiguredAuthorizer, Principal, WriteAuthorizer};
pub use config::{AppConfig, ConfigError};
pub use errors::{ApiError, ErrorResponse};
pub use metrics::{NoOpMetrics, OperationMetrics, PrometheusMetrics};
pub use server::{ApiConfig, ApiServer};

/// API version
pub const API_VERSION: &str = "v1";

/// Default API port
pub const DEFAULT_PORT: u16 = 8080;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Version histories and their versions
    pub histories: Arc<VersionHistoryStore>,

    /// Lifecycle stage of every item referenced by a version
    pub items: Arc<ItemCatalog>,

    /// Bundles, their bitstreams and primary bitstream pointers
    pub bundles: Arc<BundleRegister>,

    /// Versioning settings (enablement, paging limits)
    pub settings: Arc<VersioningSettings>,

    /// Decides which principals may perform write operations
    pub authorizer: Arc<dyn WriteAuthorizer>,

    /// Operation counters
    pub metrics: Arc<dyn OperationMetrics>,
}

impl AppState {
    /// Create application state with empty stores.
    ///
    /// The version-history store uses the current-version policy described
    /// by `settings`. Metrics are disabled until [`AppState::with_metrics`]
    /// is called.
    pub fn new(settings: VersioningSettings, authorizer: Arc<dyn WriteAuthorizer>) -> Self {
        let items = Arc::new(ItemCatalog::new());
        let histories = VersionHistoryStore::new(items.clone())
            .with_policy(settings.current_version_policy());

        Self {
            histories: Arc::new(histories),
            items,
            bundles: Arc::new(BundleRegister::new()),
            settings: Arc::new(settings),
            authorizer,
            metrics: Arc::new(NoOpMetrics::new()),
        }
    }

    /// Create application state from a loaded configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.versioning.clone(),
            Arc::new(ConfiguredAuthorizer::from_config(&config.auth)),
        )
    }

    /// Replace the metrics recorder
    pub fn with_metrics(mut self, metrics: Arc<dyn OperationMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}
