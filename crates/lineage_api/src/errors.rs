//! Error handling and HTTP error conversion
//!
//! Domain errors from `lineage_core` are converted to HTTP responses with
//! a fixed status per variant. 5xx bodies never carry internal messages.
//!
//! | Domain error | Status |
//! |---|---|
//! | `NotFound` | 404 |
//! | `InvalidArgument` | 400 |
//! | `AlreadySet` | 400 |
//! | `NothingToModify` | 400 |
//! | `UnprocessableReference` | 422 |
//! | `Storage` | 500 |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lineage_core::VersioningError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Standard error response for all API errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetails,
}

/// Error details structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Additional context (optional, type varies by error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Build an error body
    pub fn new(code: &str, message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            error: ErrorDetails {
                code: code.to_string(),
                message: message.into(),
                details,
            },
        }
    }
}

/// Errors returned by handlers.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<VersionResponse>, ApiError> {
///     let version = state.histories.last_version(id)?; // VersioningError converts
///     Ok(Json(version.into()))
/// }
/// ```
#[derive(Debug, Error)]
pub enum ApiError {
    /// A domain operation failed
    #[error(transparent)]
    Versioning(#[from] VersioningError),

    /// The authenticated principal may not perform the operation
    #[error("Principal '{principal}' may not {action}")]
    Forbidden { principal: String, action: String },

    /// Versioning is switched off by configuration
    #[error("Versioning is disabled")]
    VersioningDisabled { authenticated: bool },

    /// A failure outside the domain, e.g. metrics encoding
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Create a forbidden error
    pub fn forbidden(principal: impl Into<String>, action: impl Into<String>) -> Self {
        Self::Forbidden {
            principal: principal.into(),
            action: action.into(),
        }
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Versioning(err) => versioning_status(err),
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::VersioningDisabled { authenticated: true } => StatusCode::FORBIDDEN,
            ApiError::VersioningDisabled { authenticated: false } => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code, also used as the metrics outcome label
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Versioning(err) => versioning_code(err),
            ApiError::Forbidden { .. } => "Forbidden",
            ApiError::VersioningDisabled { .. } => "VersioningDisabled",
            ApiError::Internal(_) => "InternalError",
        }
    }

    fn to_response_body(&self) -> ErrorResponse {
        let status = self.status();
        if status.is_server_error() {
            return ErrorResponse::new(self.code(), "An internal error occurred", None);
        }

        let details = match self {
            ApiError::Versioning(VersioningError::NotFound { entity, id }) => {
                Some(json!({ "entity": entity, "id": id }))
            }
            ApiError::Versioning(VersioningError::InvalidArgument { field, .. }) => {
                Some(json!({ "field": field }))
            }
            ApiError::Versioning(VersioningError::UnprocessableReference { reference, .. }) => {
                Some(json!({ "reference": reference }))
            }
            ApiError::Versioning(VersioningError::AlreadySet { bundle })
            | ApiError::Versioning(VersioningError::NothingToModify { bundle }) => {
                Some(json!({ "bundle": bundle }))
            }
            ApiError::Forbidden { action, .. } => Some(json!({ "action": action })),
            _ => None,
        };

        ErrorResponse::new(self.code(), self.to_string(), details)
    }
}

/// Status for a domain error.
///
/// `AlreadySet` answers 400 like the other slot-state errors.
pub fn versioning_status(error: &VersioningError) -> StatusCode {
    match error {
        VersioningError::NotFound { .. } => StatusCode::NOT_FOUND,
        VersioningError::InvalidArgument { .. }
        | VersioningError::AlreadySet { .. }
        | VersioningError::NothingToModify { .. } => StatusCode::BAD_REQUEST,
        VersioningError::UnprocessableReference { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        VersioningError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn versioning_code(error: &VersioningError) -> &'static str {
    match error {
        VersioningError::NotFound { .. } => "NotFound",
        VersioningError::InvalidArgument { .. } => "InvalidArgument",
        VersioningError::AlreadySet { .. } => "AlreadySet",
        VersioningError::NothingToModify { .. } => "NothingToModify",
        VersioningError::UnprocessableReference { .. } => "UnprocessableReference",
        VersioningError::Storage(_) => "StorageError",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        log_error(&self, status);

        (status, Json(self.to_response_body())).into_response()
    }
}

/// Log error with appropriate level based on HTTP status
fn log_error(error: &ApiError, status: StatusCode) {
    if status.is_server_error() {
        tracing::error!(status = %status, code = error.code(), "API error: {}", error);
    } else {
        tracing::warn!(status = %status, code = error.code(), "API error: {}", error);
    }
}
