//! HTTP request handlers
//!
//! Each handler:
//! 1. Parses path, query and body input into domain identifiers
//! 2. Checks write authorization for the authenticated principal
//! 3. Calls the core component and counts the outcome
//! 4. Translates the result to an HTTP response

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use lineage_core::{BundleId, VersionHistoryId, VersionId, VersioningResult};

use crate::{
    authorization::Principal,
    errors::ApiError,
    metrics::SUCCESS,
    models::{
        BitstreamResponse, BundleResponse, HealthCheckResponse, PageQuery, VersionHistoryResponse,
        VersionPageResponse, VersionResponse,
    },
    translation::{page_request, parse_bitstream_reference},
    AppState,
};

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;

/// Count the outcome of a core call and convert its error
fn observe<T>(state: &AppState, operation: &str, result: VersioningResult<T>) -> Result<T, ApiError> {
    let result = result.map_err(ApiError::from);
    let outcome = match &result {
        Ok(_) => SUCCESS,
        Err(err) => err.code(),
    };
    state.metrics.record_operation(operation, outcome);
    result
}

/// Convert an input parsing error, counting only failures
fn parsed<T>(state: &AppState, operation: &str, result: VersioningResult<T>) -> Result<T, ApiError> {
    result.map_err(|err| {
        let err = ApiError::from(err);
        state.metrics.record_operation(operation, err.code());
        err
    })
}

fn history_id(state: &AppState, operation: &str, raw: &str) -> Result<VersionHistoryId, ApiError> {
    parsed(state, operation, VersionHistoryId::parse(raw))
}

async fn authorize_bundle(state: &AppState, principal: &Principal, bundle: BundleId) -> Result<(), ApiError> {
    if state.authorizer.may_modify_bundle(principal, bundle).await {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            &principal.name,
            format!("modify bundle {}", bundle),
        ))
    }
}

// ============================================================================
// Version histories
// ============================================================================

/// GET /api/versioning/versionhistories/:id
pub async fn get_version_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VersionHistoryResponse>, ApiError> {
    const OPERATION: &str = "find_history";
    let id = history_id(&state, OPERATION, &id)?;

    let summary = observe(&state, OPERATION, state.histories.find_history(id))?;
    Ok(Json(summary.into()))
}

/// GET /api/versioning/versionhistories/:id/versions
///
/// Versions most recent first, paged with `?page=&size=`.
pub async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<VersionPageResponse>, ApiError> {
    const OPERATION: &str = "list_versions";
    let id = history_id(&state, OPERATION, &id)?;
    let request = parsed(&state, OPERATION, page_request(&state.settings, &query))?;

    let page = observe(&state, OPERATION, state.histories.list_versions(id, request))?;
    Ok(Json(page.into()))
}

/// GET /api/versioning/versionhistories/:id/oldestversion
pub async fn get_oldest_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VersionResponse>, ApiError> {
    const OPERATION: &str = "oldest_version";
    let id = history_id(&state, OPERATION, &id)?;

    let version = observe(&state, OPERATION, state.histories.oldest_version(id))?;
    Ok(Json(version.into()))
}

/// GET /api/versioning/versionhistories/:id/currentversion
pub async fn get_current_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VersionResponse>, ApiError> {
    const OPERATION: &str = "current_version";
    let id = history_id(&state, OPERATION, &id)?;

    let version = observe(&state, OPERATION, state.histories.current_version(id))?;
    Ok(Json(version.into()))
}

/// GET /api/versioning/versionhistories/:id/lastversion
pub async fn get_last_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VersionResponse>, ApiError> {
    const OPERATION: &str = "last_version";
    let id = history_id(&state, OPERATION, &id)?;

    let version = observe(&state, OPERATION, state.histories.last_version(id))?;
    Ok(Json(version.into()))
}

/// GET /api/versioning/versionhistories/:id/draftVersion
///
/// 200 with the draft version, 204 when the last version is not a draft.
pub async fn get_draft_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    const OPERATION: &str = "draft_version";
    let id = history_id(&state, OPERATION, &id)?;

    match observe(&state, OPERATION, state.histories.draft_version(id))? {
        Some(version) => Ok(Json(VersionResponse::from(version)).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

// ============================================================================
// Versions
// ============================================================================

/// GET /api/versioning/versions/:id
pub async fn get_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VersionResponse>, ApiError> {
    const OPERATION: &str = "find_version";
    let id = parsed(&state, OPERATION, VersionId::parse(&id))?;

    let version = observe(&state, OPERATION, state.histories.find_version(id))?;
    Ok(Json(version.into()))
}

/// DELETE /api/versioning/versions/:id
///
/// Requires a principal allowed to manage versions.
pub async fn delete_version(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    const OPERATION: &str = "remove_version";
    let id = parsed(&state, OPERATION, VersionId::parse(&id))?;

    if !state.authorizer.may_manage_versions(&principal).await {
        return Err(ApiError::forbidden(&principal.name, "manage versions"));
    }

    observe(&state, OPERATION, state.histories.remove_version(id))?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Primary bitstream
// ============================================================================

/// GET /api/core/bundles/:id/primaryBitstream
///
/// 200 with the primary bitstream, 204 when none is designated.
pub async fn get_primary_bitstream(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    const OPERATION: &str = "get_primary_bitstream";
    let bundle = parsed(&state, OPERATION, BundleId::parse(&id))?;

    match observe(&state, OPERATION, state.bundles.get(bundle))? {
        Some(bitstream) => Ok(Json(BitstreamResponse::new(bitstream, bundle)).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// POST /api/core/bundles/:id/primaryBitstream
///
/// Body: `text/uri-list` with the URI of a bitstream of this bundle. An
/// unknown bundle is reported before an unusable body.
pub async fn set_primary_bitstream(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    body: String,
) -> Result<Response, ApiError> {
    const OPERATION: &str = "set_primary_bitstream";
    let bundle = parsed(&state, OPERATION, BundleId::parse(&id))?;
    authorize_bundle(&state, &principal, bundle).await?;

    let result = state
        .bundles
        .get(bundle)
        .and_then(|_| parse_bitstream_reference(&body))
        .and_then(|bitstream| state.bundles.set(bundle, bitstream));
    let snapshot = observe(&state, OPERATION, result)?;

    let location = format!("/api/core/bundles/{}/primaryBitstream", bundle);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(BundleResponse::from(snapshot)),
    )
        .into_response())
}

/// PUT /api/core/bundles/:id/primaryBitstream
///
/// Body: `text/uri-list` with the URI of a bitstream of this bundle.
pub async fn replace_primary_bitstream(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    body: String,
) -> Result<Json<BundleResponse>, ApiError> {
    const OPERATION: &str = "replace_primary_bitstream";
    let bundle = parsed(&state, OPERATION, BundleId::parse(&id))?;
    authorize_bundle(&state, &principal, bundle).await?;

    let result = state
        .bundles
        .get(bundle)
        .and_then(|_| parse_bitstream_reference(&body))
        .and_then(|bitstream| state.bundles.replace(bundle, bitstream));
    let snapshot = observe(&state, OPERATION, result)?;

    Ok(Json(snapshot.into()))
}

/// DELETE /api/core/bundles/:id/primaryBitstream
pub async fn clear_primary_bitstream(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    const OPERATION: &str = "clear_primary_bitstream";
    let bundle = parsed(&state, OPERATION, BundleId::parse(&id))?;
    authorize_bundle(&state, &principal, bundle).await?;

    observe(&state, OPERATION, state.bundles.clear(bundle))?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Operational endpoints
// ============================================================================

/// GET /api/health
pub async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /api/metrics
///
/// Prometheus text exposition format.
pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
