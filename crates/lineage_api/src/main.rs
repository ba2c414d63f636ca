//! Lineage REST API Server
//!
//! Main binary for running the API server.
//!
//! # Environment Variables
//!
//! - `LINEAGE_CONFIG`: Path of the TOML configuration file (default: none, built-in defaults)
//! - `API_PORT`: Port to listen on (default: 8080)
//! - `API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `RUST_LOG`: Log level (default: info)
//! - `LOG_FORMAT`: `json` for JSON log lines (default: human readable)

use std::{env, sync::Arc};

use anyhow::Context;
use lineage_api::{AppConfig, AppState, ApiServer, PrometheusMetrics, API_VERSION};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let metrics = PrometheusMetrics::new().context("Failed to register metrics")?;

    let state = AppState::from_config(&config).with_metrics(Arc::new(metrics));

    tracing::info!("Starting Lineage API server");
    tracing::info!("API version: {}", API_VERSION);
    tracing::info!(
        versioning_enabled = config.versioning.enabled,
        principals = config.auth.principals.len(),
        "Configuration applied"
    );

    let server = ApiServer::new(config.server, state);
    server.serve().await
}
