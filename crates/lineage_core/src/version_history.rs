//! Version history store.
//!
//! Keeps, per lineage, an authoritative ordering of versions and answers
//! positional queries over it.
//!
//! # Ordering
//!
//! Versions are ordered by their caller-supplied `sequence_id`. Sequence
//! numbers need not be contiguous and are not required to be unique; ties
//! are broken by a store-wide insertion ordinal, so among versions with the
//! same sequence number the most recently inserted one sorts last.
//!
//! - oldest: minimum `(sequence_id, ordinal)`
//! - last: maximum `(sequence_id, ordinal)`, whatever the item's stage
//! - current: maximum among versions whose item stage is accepted by the
//!   [`CurrentVersionPolicy`]
//! - draft: the last version, if its item is still in progress
//!
//! # Concurrency
//!
//! Each history sits behind its own mutex, so writers on one history are
//! linearized while distinct histories proceed in parallel. Lock order is
//! history record first, then the version index.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{StorageError, VersioningError, VersioningResult};
use crate::identifiers::{ItemId, SubmitterId, VersionHistoryId, VersionId};
use crate::item_stage::{CurrentVersionPolicy, ItemStage, ItemStageLookup};
use crate::pagination::{Page, PageRequest};
use crate::Timestamp;

#[cfg(test)]
#[path = "version_history_tests.rs"]
mod tests;

const HISTORY_ENTITY: &str = "VersionHistory";
const VERSION_ENTITY: &str = "Version";

/// One snapshot entry of a version history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Identifier allocated by the store
    pub id: VersionId,

    /// History this version belongs to
    pub history_id: VersionHistoryId,

    /// Item holding the content of this version
    pub item_id: ItemId,

    /// Caller-supplied ordering key
    pub sequence_id: i64,

    /// Free-text summary of the change
    pub summary: String,

    /// Person who created the version
    pub submitter_id: SubmitterId,

    /// When the version was created
    pub created_at: Timestamp,
}

/// Input for [`VersionHistoryStore::add_version`]
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub item_id: ItemId,
    pub sequence_id: i64,
    pub summary: String,
    pub submitter_id: SubmitterId,
    pub created_at: Timestamp,
}

impl NewVersion {
    /// Describe a version created now
    pub fn new(
        item_id: ItemId,
        sequence_id: i64,
        summary: impl Into<String>,
        submitter_id: SubmitterId,
    ) -> Self {
        Self {
            item_id,
            sequence_id,
            summary: summary.into(),
            submitter_id,
            created_at: Timestamp::now(),
        }
    }

    /// Override the creation date
    pub fn created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Metadata about a version history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionHistorySummary {
    pub id: VersionHistoryId,

    /// Number of versions currently in the history
    pub version_count: usize,

    /// Whether the last version's item is still in progress
    pub draft_version: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct OrderKey {
    sequence_id: i64,
    ordinal: u64,
}

#[derive(Debug, Default)]
struct HistoryRecord {
    versions: BTreeMap<OrderKey, Version>,
}

#[derive(Debug, Default)]
struct VersionIndex {
    by_version: HashMap<VersionId, (VersionHistoryId, OrderKey)>,
    by_item: HashMap<ItemId, VersionHistoryId>,
}

/// Store of version histories.
pub struct VersionHistoryStore {
    histories: RwLock<HashMap<VersionHistoryId, Arc<Mutex<HistoryRecord>>>>,
    index: RwLock<VersionIndex>,
    next_history_id: AtomicI32,
    next_version_id: AtomicI32,
    next_ordinal: AtomicU64,
    items: Arc<dyn ItemStageLookup>,
    policy: CurrentVersionPolicy,
}

impl VersionHistoryStore {
    /// Create an empty store using the default current-version policy.
    ///
    /// # Arguments
    ///
    /// * `items` - Lookup used to resolve the lifecycle stage of version items
    pub fn new(items: Arc<dyn ItemStageLookup>) -> Self {
        Self {
            histories: RwLock::new(HashMap::new()),
            index: RwLock::new(VersionIndex::default()),
            next_history_id: AtomicI32::new(1),
            next_version_id: AtomicI32::new(1),
            next_ordinal: AtomicU64::new(0),
            items,
            policy: CurrentVersionPolicy::default(),
        }
    }

    /// Replace the current-version policy
    pub fn with_policy(mut self, policy: CurrentVersionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The policy deciding which versions can be current
    pub fn policy(&self) -> &CurrentVersionPolicy {
        &self.policy
    }

    /// Allocate a new, empty version history.
    pub fn create(&self) -> VersioningResult<VersionHistoryId> {
        let id = VersionHistoryId::new(allocate_id(&self.next_history_id, HISTORY_ENTITY)?)?;

        let mut histories = self
            .histories
            .write()
            .map_err(|_| StorageError::lock_poisoned("version histories"))?;
        histories.insert(id, Arc::new(Mutex::new(HistoryRecord::default())));

        info!(history_id = %id, "Version history created");
        Ok(id)
    }

    /// Append a version to a history.
    ///
    /// Duplicate sequence numbers are accepted. An item belongs to at most
    /// one history.
    ///
    /// # Errors
    ///
    /// Returns `VersioningError::NotFound` if the history does not exist and
    /// `VersioningError::InvalidArgument` if the item is already versioned in
    /// another history.
    pub fn add_version(
        &self,
        history_id: VersionHistoryId,
        new_version: NewVersion,
    ) -> VersioningResult<Version> {
        let record = self.history(history_id)?;
        let mut record = lock_record(&record, history_id)?;
        let mut index = self.write_index()?;

        if let Some(owner) = index.by_item.get(&new_version.item_id) {
            if *owner != history_id {
                return Err(VersioningError::invalid_argument(
                    "item_id",
                    format!(
                        "item {} is already versioned in history {}",
                        new_version.item_id, owner
                    ),
                ));
            }
        }

        let id = VersionId::new(allocate_id(&self.next_version_id, VERSION_ENTITY)?)?;
        let key = OrderKey {
            sequence_id: new_version.sequence_id,
            ordinal: self.next_ordinal.fetch_add(1, Ordering::SeqCst),
        };
        let version = Version {
            id,
            history_id,
            item_id: new_version.item_id,
            sequence_id: new_version.sequence_id,
            summary: new_version.summary,
            submitter_id: new_version.submitter_id,
            created_at: new_version.created_at,
        };
        record.versions.insert(key, version.clone());
        index.by_version.insert(id, (history_id, key));
        index.by_item.insert(version.item_id, history_id);
        drop(index);

        info!(
            history_id = %history_id,
            version_id = %id,
            sequence_id = version.sequence_id,
            item_id = %version.item_id,
            "Version added"
        );
        Ok(version)
    }

    /// List the versions of a history, newest first.
    ///
    /// Only the versions of the requested page are copied out of the
    /// history; repeated identical requests return identical pages.
    pub fn list_versions(
        &self,
        history_id: VersionHistoryId,
        request: PageRequest,
    ) -> VersioningResult<Page<Version>> {
        let record = self.history(history_id)?;
        let record = lock_record(&record, history_id)?;

        let total = record.versions.len();
        let page = Page::slice(request, total, record.versions.values().rev().cloned());

        debug!(
            history_id = %history_id,
            page = page.number,
            size = page.size,
            total = total,
            "Versions listed"
        );
        Ok(page)
    }

    /// The version with the lowest sequence number.
    pub fn oldest_version(&self, history_id: VersionHistoryId) -> VersioningResult<Version> {
        let record = self.history(history_id)?;
        let record = lock_record(&record, history_id)?;

        record
            .versions
            .values()
            .next()
            .cloned()
            .ok_or_else(|| no_versions(history_id, "oldest"))
    }

    /// The version with the highest sequence number, whatever its item's stage.
    pub fn last_version(&self, history_id: VersionHistoryId) -> VersioningResult<Version> {
        let record = self.history(history_id)?;
        let record = lock_record(&record, history_id)?;

        record
            .versions
            .values()
            .next_back()
            .cloned()
            .ok_or_else(|| no_versions(history_id, "last"))
    }

    /// The version with the highest sequence number among those whose item
    /// stage the current-version policy accepts.
    ///
    /// Versions whose item stage cannot be found are skipped.
    pub fn current_version(&self, history_id: VersionHistoryId) -> VersioningResult<Version> {
        let record = self.history(history_id)?;
        let record = lock_record(&record, history_id)?;

        for version in record.versions.values().rev() {
            let stage = self.items.stage_of(&version.item_id)?;
            if self.policy.is_eligible(stage) {
                return Ok(version.clone());
            }
        }

        Err(no_versions(history_id, "current"))
    }

    /// The last version, if its item is still in the workspace or workflow.
    ///
    /// Returns `Ok(None)` when the history is empty or its last version has
    /// been archived.
    pub fn draft_version(&self, history_id: VersionHistoryId) -> VersioningResult<Option<Version>> {
        let record = self.history(history_id)?;
        let record = lock_record(&record, history_id)?;

        self.draft_of(&record)
    }

    /// Metadata about a history.
    pub fn find_history(&self, history_id: VersionHistoryId) -> VersioningResult<VersionHistorySummary> {
        let record = self.history(history_id)?;
        let record = lock_record(&record, history_id)?;

        Ok(VersionHistorySummary {
            id: history_id,
            version_count: record.versions.len(),
            draft_version: self.draft_of(&record)?.is_some(),
        })
    }

    /// Look up a single version.
    pub fn find_version(&self, version_id: VersionId) -> VersioningResult<Version> {
        let (history_id, key) = self.locate(version_id)?;
        let record = self.history(history_id)?;
        let record = lock_record(&record, history_id)?;

        record
            .versions
            .get(&key)
            .cloned()
            .ok_or_else(|| VersioningError::not_found(VERSION_ENTITY, version_id))
    }

    /// The history holding the versions of the given item.
    pub fn find_by_item(&self, item_id: ItemId) -> VersioningResult<VersionHistoryId> {
        let index = self
            .index
            .read()
            .map_err(|_| StorageError::lock_poisoned("version index"))?;

        index
            .by_item
            .get(&item_id)
            .copied()
            .ok_or_else(|| VersioningError::not_found(HISTORY_ENTITY, format!("item {}", item_id)))
    }

    /// Remove a version from its history, e.g. because its item was deleted.
    ///
    /// Paging totals and positional queries reflect the removal immediately.
    pub fn remove_version(&self, version_id: VersionId) -> VersioningResult<Version> {
        let (history_id, key) = self.locate(version_id)?;
        let record = self.history(history_id)?;
        let mut record = lock_record(&record, history_id)?;

        let removed = record
            .versions
            .remove(&key)
            .ok_or_else(|| VersioningError::not_found(VERSION_ENTITY, version_id))?;
        let item_still_referenced = record
            .versions
            .values()
            .any(|v| v.item_id == removed.item_id);

        {
            let mut index = self.write_index()?;
            index.by_version.remove(&version_id);
            if !item_still_referenced {
                index.by_item.remove(&removed.item_id);
            }
        }

        info!(
            history_id = %history_id,
            version_id = %version_id,
            remaining = record.versions.len(),
            "Version removed"
        );
        Ok(removed)
    }

    fn draft_of(&self, record: &HistoryRecord) -> VersioningResult<Option<Version>> {
        match record.versions.values().next_back() {
            Some(last) => {
                let stage = self.items.stage_of(&last.item_id)?;
                Ok(stage
                    .filter(ItemStage::is_in_progress)
                    .map(|_| last.clone()))
            }
            None => Ok(None),
        }
    }

    fn history(&self, history_id: VersionHistoryId) -> VersioningResult<Arc<Mutex<HistoryRecord>>> {
        let histories = self
            .histories
            .read()
            .map_err(|_| StorageError::lock_poisoned("version histories"))?;

        histories
            .get(&history_id)
            .cloned()
            .ok_or_else(|| VersioningError::not_found(HISTORY_ENTITY, history_id))
    }

    fn locate(&self, version_id: VersionId) -> VersioningResult<(VersionHistoryId, OrderKey)> {
        let index = self
            .index
            .read()
            .map_err(|_| StorageError::lock_poisoned("version index"))?;

        index
            .by_version
            .get(&version_id)
            .copied()
            .ok_or_else(|| VersioningError::not_found(VERSION_ENTITY, version_id))
    }

    fn write_index(&self) -> Result<std::sync::RwLockWriteGuard<'_, VersionIndex>, StorageError> {
        self.index
            .write()
            .map_err(|_| StorageError::lock_poisoned("version index"))
    }
}

fn lock_record(
    record: &Mutex<HistoryRecord>,
    history_id: VersionHistoryId,
) -> Result<MutexGuard<'_, HistoryRecord>, StorageError> {
    record
        .lock()
        .map_err(|_| StorageError::lock_poisoned(format!("version history {}", history_id)))
}

fn allocate_id(counter: &AtomicI32, entity: &str) -> Result<i32, StorageError> {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| current.checked_add(1))
        .map_err(|_| StorageError::IdentifiersExhausted {
            entity: entity.to_string(),
        })
}

fn no_versions(history_id: VersionHistoryId, position: &str) -> VersioningError {
    VersioningError::not_found(
        VERSION_ENTITY,
        format!("{} version of history {}", position, history_id),
    )
}
