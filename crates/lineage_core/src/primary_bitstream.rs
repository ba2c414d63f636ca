//! Bundle register: bitstream membership and the primary bitstream pointer.
//!
//! Every bundle owns an ordered list of bitstreams and a single slot that
//! may point at one of them. The register enforces, independently of who
//! calls it, that a set pointer always references a bitstream currently
//! contained in the same bundle:
//!
//! - `set` and `replace` re-check membership every time;
//! - removing or moving the primary bitstream out of its bundle clears the
//!   pointer (the bitstream itself is never touched by `clear`).
//!
//! # Concurrency
//!
//! Each bundle record has its own mutex; operations on one bundle are
//! linearized, operations on distinct bundles run in parallel. A move locks
//! both bundles in ascending id order. Lock order is bundle record(s) first,
//! then the membership index.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{StorageError, VersioningError, VersioningResult};
use crate::identifiers::{BitstreamId, BundleId};

#[cfg(test)]
#[path = "primary_bitstream_tests.rs"]
mod tests;

const BUNDLE_ENTITY: &str = "Bundle";
const BITSTREAM_ENTITY: &str = "Bitstream";

/// Point-in-time view of a bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSnapshot {
    pub id: BundleId,

    /// Bundle name, e.g. `ORIGINAL`
    pub name: String,

    /// Member bitstreams in insertion order
    pub bitstreams: Vec<BitstreamId>,

    /// The primary bitstream, if one is designated
    pub primary_bitstream: Option<BitstreamId>,
}

#[derive(Debug)]
struct BundleRecord {
    name: String,
    bitstreams: Vec<BitstreamId>,
    primary: Option<BitstreamId>,
}

impl BundleRecord {
    fn contains(&self, bitstream: &BitstreamId) -> bool {
        self.bitstreams.contains(bitstream)
    }

    fn snapshot(&self, id: BundleId) -> BundleSnapshot {
        BundleSnapshot {
            id,
            name: self.name.clone(),
            bitstreams: self.bitstreams.clone(),
            primary_bitstream: self.primary,
        }
    }

    /// Drop a member, clearing the pointer if it referenced it.
    ///
    /// Returns whether the pointer was cleared.
    fn detach(&mut self, bitstream: &BitstreamId) -> bool {
        self.bitstreams.retain(|b| b != bitstream);
        if self.primary.as_ref() == Some(bitstream) {
            self.primary = None;
            return true;
        }
        false
    }
}

/// Register of bundles, their bitstreams and their primary bitstream.
#[derive(Debug, Default)]
pub struct BundleRegister {
    bundles: RwLock<HashMap<BundleId, Arc<Mutex<BundleRecord>>>>,
    membership: RwLock<HashMap<BitstreamId, BundleId>>,
}

impl BundleRegister {
    /// Create an empty register
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bundle.
    pub fn create_bundle(&self, name: impl Into<String>) -> VersioningResult<BundleId> {
        let id = BundleId::new();
        let name = name.into();

        let mut bundles = self
            .bundles
            .write()
            .map_err(|_| StorageError::lock_poisoned("bundles"))?;
        bundles.insert(
            id,
            Arc::new(Mutex::new(BundleRecord {
                name: name.clone(),
                bitstreams: Vec::new(),
                primary: None,
            })),
        );

        info!(bundle_id = %id, name = %name, "Bundle created");
        Ok(id)
    }

    /// Create a bitstream as a member of a bundle.
    pub fn add_bitstream(&self, bundle_id: BundleId) -> VersioningResult<BitstreamId> {
        let record = self.bundle(bundle_id)?;
        let mut record = lock_record(&record, bundle_id)?;

        let bitstream = BitstreamId::new();
        record.bitstreams.push(bitstream);
        self.write_membership()?.insert(bitstream, bundle_id);

        info!(bundle_id = %bundle_id, bitstream_id = %bitstream, "Bitstream added to bundle");
        Ok(bitstream)
    }

    /// Remove a bitstream from its bundle.
    ///
    /// If it was the primary bitstream, the pointer is cleared.
    pub fn remove_bitstream(&self, bundle_id: BundleId, bitstream: BitstreamId) -> VersioningResult<()> {
        let record = self.bundle(bundle_id)?;
        let mut record = lock_record(&record, bundle_id)?;

        if !record.contains(&bitstream) {
            return Err(VersioningError::not_found(
                BITSTREAM_ENTITY,
                format!("{} in bundle {}", bitstream, bundle_id),
            ));
        }

        let cleared = record.detach(&bitstream);
        self.write_membership()?.remove(&bitstream);

        info!(
            bundle_id = %bundle_id,
            bitstream_id = %bitstream,
            primary_cleared = cleared,
            "Bitstream removed from bundle"
        );
        Ok(())
    }

    /// Move a bitstream into another bundle.
    ///
    /// A primary pointer on the source bundle referencing it is cleared.
    pub fn move_bitstream(&self, bitstream: BitstreamId, target_id: BundleId) -> VersioningResult<()> {
        let target = self.bundle(target_id)?;

        loop {
            let source_id = self.owner_of(&bitstream)?.ok_or_else(|| {
                VersioningError::not_found(BITSTREAM_ENTITY, bitstream)
            })?;
            if source_id == target_id {
                return Ok(());
            }
            let source = self.bundle(source_id)?;

            let (first, second) = if source_id < target_id {
                (&source, &target)
            } else {
                (&target, &source)
            };
            let (first_id, second_id) = if source_id < target_id {
                (source_id, target_id)
            } else {
                (target_id, source_id)
            };
            let mut first_guard = lock_record(first, first_id)?;
            let mut second_guard = lock_record(second, second_id)?;
            let (source_record, target_record) = if source_id < target_id {
                (&mut *first_guard, &mut *second_guard)
            } else {
                (&mut *second_guard, &mut *first_guard)
            };

            if !source_record.contains(&bitstream) {
                // moved by someone else between the index read and the locks
                debug!(bitstream_id = %bitstream, "Bitstream owner changed, retrying move");
                continue;
            }

            let cleared = source_record.detach(&bitstream);
            target_record.bitstreams.push(bitstream);
            self.write_membership()?.insert(bitstream, target_id);

            info!(
                bitstream_id = %bitstream,
                source_bundle_id = %source_id,
                target_bundle_id = %target_id,
                primary_cleared = cleared,
                "Bitstream moved"
            );
            return Ok(());
        }
    }

    /// Point-in-time view of a bundle.
    pub fn find_bundle(&self, bundle_id: BundleId) -> VersioningResult<BundleSnapshot> {
        let record = self.bundle(bundle_id)?;
        let record = lock_record(&record, bundle_id)?;
        Ok(record.snapshot(bundle_id))
    }

    /// The current primary bitstream, `None` when unset.
    pub fn get(&self, bundle_id: BundleId) -> VersioningResult<Option<BitstreamId>> {
        let record = self.bundle(bundle_id)?;
        let record = lock_record(&record, bundle_id)?;

        debug!(bundle_id = %bundle_id, primary = ?record.primary, "Primary bitstream read");
        Ok(record.primary)
    }

    /// Designate a primary bitstream on a bundle that has none.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the bundle does not exist
    /// - `AlreadySet` if a primary bitstream is already designated; the
    ///   existing pointer is left intact
    /// - `UnprocessableReference` if the bitstream does not exist or is not
    ///   a member of the bundle
    pub fn set(&self, bundle_id: BundleId, bitstream: BitstreamId) -> VersioningResult<BundleSnapshot> {
        let record = self.bundle(bundle_id)?;
        let mut record = lock_record(&record, bundle_id)?;

        if record.primary.is_some() {
            return Err(VersioningError::AlreadySet {
                bundle: bundle_id.to_string(),
            });
        }
        self.ensure_member(&record, bundle_id, bitstream)?;

        record.primary = Some(bitstream);
        info!(bundle_id = %bundle_id, bitstream_id = %bitstream, "Primary bitstream set");
        Ok(record.snapshot(bundle_id))
    }

    /// Replace the primary bitstream of a bundle that has one.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the bundle does not exist
    /// - `NothingToModify` if no primary bitstream is designated
    /// - `UnprocessableReference` as for [`BundleRegister::set`]
    pub fn replace(&self, bundle_id: BundleId, bitstream: BitstreamId) -> VersioningResult<BundleSnapshot> {
        let record = self.bundle(bundle_id)?;
        let mut record = lock_record(&record, bundle_id)?;

        let previous = record.primary.ok_or_else(|| VersioningError::NothingToModify {
            bundle: bundle_id.to_string(),
        })?;
        self.ensure_member(&record, bundle_id, bitstream)?;

        record.primary = Some(bitstream);
        info!(
            bundle_id = %bundle_id,
            previous_bitstream_id = %previous,
            bitstream_id = %bitstream,
            "Primary bitstream replaced"
        );
        Ok(record.snapshot(bundle_id))
    }

    /// Unset the primary bitstream. Member bitstreams are left untouched.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the bundle does not exist
    /// - `NothingToModify` if no primary bitstream is designated
    pub fn clear(&self, bundle_id: BundleId) -> VersioningResult<BundleSnapshot> {
        let record = self.bundle(bundle_id)?;
        let mut record = lock_record(&record, bundle_id)?;

        let previous = record.primary.take().ok_or_else(|| VersioningError::NothingToModify {
            bundle: bundle_id.to_string(),
        })?;

        info!(bundle_id = %bundle_id, previous_bitstream_id = %previous, "Primary bitstream cleared");
        Ok(record.snapshot(bundle_id))
    }

    fn ensure_member(
        &self,
        record: &BundleRecord,
        bundle_id: BundleId,
        bitstream: BitstreamId,
    ) -> VersioningResult<()> {
        if record.contains(&bitstream) {
            return Ok(());
        }

        let reason = match self.owner_of(&bitstream)? {
            Some(owner) => format!(
                "bitstream belongs to bundle {}, not to bundle {}",
                owner, bundle_id
            ),
            None => "bitstream does not exist".to_string(),
        };
        Err(VersioningError::unprocessable(bitstream, reason))
    }

    fn owner_of(&self, bitstream: &BitstreamId) -> Result<Option<BundleId>, StorageError> {
        let membership = self
            .membership
            .read()
            .map_err(|_| StorageError::lock_poisoned("bitstream membership"))?;
        Ok(membership.get(bitstream).copied())
    }

    fn bundle(&self, bundle_id: BundleId) -> VersioningResult<Arc<Mutex<BundleRecord>>> {
        let bundles = self
            .bundles
            .read()
            .map_err(|_| StorageError::lock_poisoned("bundles"))?;

        bundles
            .get(&bundle_id)
            .cloned()
            .ok_or_else(|| VersioningError::not_found(BUNDLE_ENTITY, bundle_id))
    }

    fn write_membership(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<BitstreamId, BundleId>>, StorageError> {
        self.membership
            .write()
            .map_err(|_| StorageError::lock_poisoned("bitstream membership"))
    }
}

fn lock_record(
    record: &Mutex<BundleRecord>,
    bundle_id: BundleId,
) -> Result<MutexGuard<'_, BundleRecord>, StorageError> {
    record
        .lock()
        .map_err(|_| StorageError::lock_poisoned(format!("bundle {}", bundle_id)))
}
