//! # Lineage Core
//!
//! Domain logic for two stateful subsystems of a digital repository:
//!
//! - the [`VersionHistoryStore`], which keeps an ordered history of item
//!   versions per lineage and answers oldest/current/last/draft queries;
//! - the [`BundleRegister`], which owns bundle membership of bitstreams and
//!   the single-slot primary bitstream pointer of each bundle.
//!
//! ## Architecture
//!
//! This crate has no knowledge of HTTP, principals or permissions. Callers
//! (the REST layer) resolve identity and authorization first and then call
//! into the components with plain identifiers. Every operation returns a
//! [`VersioningResult`] whose error variants map one-to-one to the failures
//! a caller must correct, plus [`StorageError`] for failures of the storage
//! boundary.
//!
//! ## Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use lineage_core::{
//!     ItemCatalog, ItemId, ItemStage, NewVersion, SubmitterId, VersionHistoryStore,
//! };
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let items = Arc::new(ItemCatalog::new());
//! let store = VersionHistoryStore::new(items.clone());
//!
//! let history = store.create()?;
//! let item = ItemId::new();
//! items.set_stage(item, ItemStage::Archived)?;
//! store.add_version(history, NewVersion::new(item, 1, "initial", SubmitterId::new()))?;
//!
//! assert_eq!(store.current_version(history)?.item_id, item);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod errors;

pub mod identifiers;
pub mod item_stage;
pub mod pagination;
pub mod primary_bitstream;
pub mod settings;
pub mod version_history;

pub use errors::{StorageError, VersioningError, VersioningResult};
pub use identifiers::{BitstreamId, BundleId, ItemId, SubmitterId, VersionHistoryId, VersionId};
pub use item_stage::{CurrentVersionPolicy, ItemCatalog, ItemStage, ItemStageLookup};
pub use pagination::{Page, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use primary_bitstream::{BundleRegister, BundleSnapshot};
pub use settings::VersioningSettings;
pub use version_history::{NewVersion, Version, VersionHistoryStore, VersionHistorySummary};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// UTC timestamp wrapper
///
/// Represents a point in time in UTC timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp for the current moment
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a DateTime<Utc>
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get the inner DateTime<Utc>
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}
