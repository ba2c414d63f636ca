//! Request middleware
//!
//! - Request tracing with a per-request id
//! - Bearer token authentication for write routes
//! - The versioning gate, which closes `/versioning` routes when versioning
//!   is disabled

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    errors::{ApiError, ErrorResponse},
    AppState,
};

#[cfg(test)]
#[path = "middleware_tests.rs"]
mod tests;

/// Authentication middleware that validates Bearer tokens.
///
/// Resolves the token through the configured [`crate::WriteAuthorizer`] and
/// attaches the resulting [`crate::Principal`] to the request extensions.
///
/// Returns 401 if the header is missing, is not a Bearer token, or the
/// token is unknown.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let token = extract_bearer_token(auth_header)?;

    let principal = state
        .authorizer
        .resolve_principal(token)
        .await
        .ok_or(AuthError::UnknownToken)?;

    tracing::debug!(principal = %principal.name, "Request authenticated");
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Closes versioning routes when versioning is disabled.
///
/// Anonymous callers get 401, authenticated ones 403.
pub async fn versioning_gate(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.settings.enabled {
        return Ok(next.run(request).await);
    }

    let authenticated = match bearer_token(&headers) {
        Some(token) => state.authorizer.resolve_principal(token).await.is_some(),
        None => false,
    };

    Err(ApiError::VersioningDisabled { authenticated })
}

/// Request tracing middleware.
///
/// Adds request ID and logging context for observability.
pub async fn tracing_middleware(request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();

    tracing::info!(
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
        "Request started"
    );

    let response = next.run(request).await;

    tracing::info!(
        request_id = %request_id,
        status = %response.status(),
        "Request completed"
    );

    response
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| extract_bearer_token(value).ok())
}

/// Extract Bearer token from Authorization header.
///
/// Expected format: "Bearer <token>"
fn extract_bearer_token(auth_header: &str) -> Result<&str, AuthError> {
    let mut parts = auth_header.split_whitespace();

    let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => (scheme, token),
        _ => return Err(AuthError::InvalidFormat),
    };

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidScheme);
    }

    Ok(token)
}

/// Authentication errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Authorization header is missing
    MissingToken,

    /// Authorization header format is invalid
    InvalidFormat,

    /// Authorization scheme is not "Bearer"
    InvalidScheme,

    /// No principal is known for the token
    UnknownToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (message, details) = match self {
            AuthError::MissingToken => (
                "Authentication required. Provide a valid Bearer token in the Authorization header.",
                Some(json!({
                    "header": "Authorization",
                    "scheme": "Bearer"
                })),
            ),
            AuthError::InvalidFormat => (
                "Invalid Authorization header format. Expected: 'Bearer <token>'",
                Some(json!({
                    "header": "Authorization",
                    "expectedFormat": "Bearer <token>"
                })),
            ),
            AuthError::InvalidScheme => (
                "Invalid authorization scheme. Only 'Bearer' tokens are supported.",
                Some(json!({
                    "header": "Authorization",
                    "supportedScheme": "Bearer"
                })),
            ),
            AuthError::UnknownToken => ("The provided token is not recognised.", None),
        };

        tracing::warn!(reason = ?self, "Authentication failed");

        let body = ErrorResponse::new("AuthenticationError", message, details);
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}
