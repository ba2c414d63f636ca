//! HTTP routing configuration
//!
//! # Route Structure
//!
//! All routes are prefixed with `/api`:
//!
//! - GET    /api/versioning/versionhistories/:id
//! - GET    /api/versioning/versionhistories/:id/versions
//! - GET    /api/versioning/versionhistories/:id/oldestversion
//! - GET    /api/versioning/versionhistories/:id/currentversion
//! - GET    /api/versioning/versionhistories/:id/lastversion
//! - GET    /api/versioning/versionhistories/:id/draftVersion
//! - GET    /api/versioning/versions/:id
//! - DELETE /api/versioning/versions/:id (authenticated)
//! - GET    /api/core/bundles/:id/primaryBitstream
//! - POST   /api/core/bundles/:id/primaryBitstream (authenticated)
//! - PUT    /api/core/bundles/:id/primaryBitstream (authenticated)
//! - DELETE /api/core/bundles/:id/primaryBitstream (authenticated)
//! - GET    /api/health
//! - GET    /api/metrics
//!
//! Every `/versioning` route sits behind the versioning gate.

use axum::{
    http::{header, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{handlers, middleware as api_middleware, server::DEFAULT_REQUEST_TIMEOUT_SECS, AppState};

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;

/// Create the complete API router with the default request timeout.
pub fn create_router(state: AppState) -> Router {
    create_router_with_timeout(state, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
}

/// Create the complete API router.
///
/// This function sets up:
/// - All endpoint routes
/// - Authentication on write routes
/// - CORS configuration
/// - Request tracing
/// - Timeout handling
pub fn create_router_with_timeout(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(false)
        .max_age(Duration::from_secs(3600));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().include_headers(false))
        .on_response(DefaultOnResponse::new().include_headers(false));

    let timeout_layer = TimeoutLayer::new(request_timeout);

    let api = Router::new()
        .nest("/versioning", versioning_routes(&state))
        .nest("/core", core_routes(&state))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(api_middleware::tracing_middleware))
        .layer(timeout_layer)
        .layer(trace_layer)
        .layer(cors)
        .with_state(state);

    Router::new().nest("/api", api)
}

/// Version history routes (nested under /versioning)
fn versioning_routes(state: &AppState) -> Router<AppState> {
    let remove_version = delete(handlers::delete_version).route_layer(
        middleware::from_fn_with_state(state.clone(), api_middleware::auth_middleware),
    );

    Router::new()
        .route(
            "/versionhistories/:id",
            get(handlers::get_version_history),
        )
        .route(
            "/versionhistories/:id/versions",
            get(handlers::list_versions),
        )
        .route(
            "/versionhistories/:id/oldestversion",
            get(handlers::get_oldest_version),
        )
        .route(
            "/versionhistories/:id/currentversion",
            get(handlers::get_current_version),
        )
        .route(
            "/versionhistories/:id/lastversion",
            get(handlers::get_last_version),
        )
        .route(
            "/versionhistories/:id/draftVersion",
            get(handlers::get_draft_version),
        )
        .route(
            "/versions/:id",
            get(handlers::get_version).merge(remove_version),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_middleware::versioning_gate,
        ))
}

/// Bundle routes (nested under /core)
fn core_routes(state: &AppState) -> Router<AppState> {
    let writes = post(handlers::set_primary_bitstream)
        .put(handlers::replace_primary_bitstream)
        .delete(handlers::clear_primary_bitstream)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api_middleware::auth_middleware,
        ));

    Router::new().route(
        "/bundles/:id/primaryBitstream",
        get(handlers::get_primary_bitstream).merge(writes),
    )
}
