//! Error types for the versioning and bundle components.
//!
//! Every failure the core can produce is local, synchronous and
//! non-retryable: callers must correct the request. The only exception is
//! [`StorageError`], which reports a failure of the persistence boundary
//! and is never replaced by default data.

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Failures of the persistence boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    /// A writer panicked while holding the lock of a record, leaving it in
    /// an unknown state.
    #[error("Storage lock poisoned: {resource}")]
    LockPoisoned { resource: String },

    /// The identifier space of a record kind is exhausted.
    #[error("Identifier space exhausted for {entity}")]
    IdentifiersExhausted { entity: String },
}

impl StorageError {
    /// Create a lock poisoning error for the named resource
    pub fn lock_poisoned(resource: impl Into<String>) -> Self {
        Self::LockPoisoned {
            resource: resource.into(),
        }
    }
}

/// Errors returned by the version-history store and the bundle register.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VersioningError {
    /// The referenced aggregate root does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The caller supplied a malformed identifier or parameter.
    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// A primary bitstream is already set on the bundle.
    #[error("Bundle {bundle} already has a primary bitstream")]
    AlreadySet { bundle: String },

    /// Replace or clear was requested while no primary bitstream is set.
    #[error("Bundle {bundle} has no primary bitstream")]
    NothingToModify { bundle: String },

    /// The referenced bitstream cannot be used as the primary bitstream.
    #[error("Unprocessable bitstream reference '{reference}': {reason}")]
    UnprocessableReference { reference: String, reason: String },

    /// The persistence boundary failed.
    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl VersioningError {
    /// Create a not found error for the given entity kind and identifier
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an unprocessable reference error
    pub fn unprocessable(reference: impl ToString, reason: impl Into<String>) -> Self {
        Self::UnprocessableReference {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error reports genuine absence of data.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for versioning operations.
pub type VersioningResult<T> = Result<T, VersioningError>;
