//! HTTP response type definitions
//!
//! Response types convert from core types via `From` and serialize with
//! camelCase field names.

use lineage_core::{BitstreamId, BundleId, BundleSnapshot, Page, Version, VersionHistorySummary};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;

/// A version history.
///
/// ```json
/// { "id": 1, "versionCount": 2, "draftVersion": false }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionHistoryResponse {
    pub id: i32,

    /// Number of versions currently in the history
    pub version_count: usize,

    /// Whether the last version's item is still being worked on
    pub draft_version: bool,
}

impl From<VersionHistorySummary> for VersionHistoryResponse {
    fn from(summary: VersionHistorySummary) -> Self {
        Self {
            id: summary.id.value(),
            version_count: summary.version_count,
            draft_version: summary.draft_version,
        }
    }
}

/// One version of a history.
///
/// ```json
/// {
///   "id": 4,
///   "version": 98,
///   "summary": "fixed title",
///   "created": "2025-11-12T10:30:00+00:00",
///   "itemId": "4bd4d6b2-...",
///   "submitterId": "0f6e2a8c-...",
///   "versionHistoryId": 1
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub id: i32,

    /// Sequence number of the version within its history
    pub version: i64,

    pub summary: String,

    /// Creation timestamp (RFC 3339)
    pub created: String,

    pub item_id: Uuid,

    pub submitter_id: Uuid,

    pub version_history_id: i32,
}

impl From<Version> for VersionResponse {
    fn from(version: Version) -> Self {
        Self {
            id: version.id.value(),
            version: version.sequence_id,
            summary: version.summary,
            created: version.created_at.to_string(),
            item_id: *version.item_id.as_uuid(),
            submitter_id: *version.submitter_id.as_uuid(),
            version_history_id: version.history_id.value(),
        }
    }
}

/// Paging metadata of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub number: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
}

/// A page of versions, most recent first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionPageResponse {
    pub versions: Vec<VersionResponse>,
    pub page: PageMetadata,
}

impl From<Page<Version>> for VersionPageResponse {
    fn from(page: Page<Version>) -> Self {
        let metadata = PageMetadata {
            number: page.number,
            size: page.size,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
        };

        Self {
            versions: page.items.into_iter().map(VersionResponse::from).collect(),
            page: metadata,
        }
    }
}

/// The primary bitstream of a bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitstreamResponse {
    pub id: Uuid,
    pub bundle_id: Uuid,
}

impl BitstreamResponse {
    pub fn new(bitstream: BitstreamId, bundle: BundleId) -> Self {
        Self {
            id: *bitstream.as_uuid(),
            bundle_id: *bundle.as_uuid(),
        }
    }
}

/// A bundle after a primary bitstream change
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleResponse {
    pub id: Uuid,
    pub name: String,

    /// Member bitstreams in insertion order
    pub bitstreams: Vec<Uuid>,

    pub primary_bitstream: Option<Uuid>,
}

impl From<BundleSnapshot> for BundleResponse {
    fn from(snapshot: BundleSnapshot) -> Self {
        Self {
            id: *snapshot.id.as_uuid(),
            name: snapshot.name,
            bitstreams: snapshot.bitstreams.iter().map(|b| *b.as_uuid()).collect(),
            primary_bitstream: snapshot.primary_bitstream.map(|b| *b.as_uuid()),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    /// Service status: "healthy" or "unhealthy"
    pub status: String,

    /// Service version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Current timestamp (ISO 8601)
    pub timestamp: String,
}
