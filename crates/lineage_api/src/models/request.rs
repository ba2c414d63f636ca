//! HTTP request type definitions

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

/// `?page=&size=` query parameters.
///
/// Kept as raw strings so malformed values are reported with the standard
/// error body instead of a framework rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    /// Zero-based page number
    pub page: Option<String>,

    /// Page size
    pub size: Option<String>,
}
