//! Item lifecycle stages.
//!
//! A version points at an item that may still be a workspace submission,
//! sit in a review workflow, or be archived. The stage decides whether a
//! version counts as the "current" one and whether a history has a draft.
//!
//! The stage of an item is owned by the submission flows outside this
//! crate, so the store reads it through the [`ItemStageLookup`] seam.
//! [`ItemCatalog`] is the in-memory implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::StorageError;
use crate::identifiers::ItemId;

#[cfg(test)]
#[path = "item_stage_tests.rs"]
mod tests;

/// Lifecycle stage of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStage {
    /// Submission still being edited by its submitter
    Workspace,

    /// Submission waiting in a review workflow
    Workflow,

    /// Completed, archived item
    Archived,
}

impl ItemStage {
    /// Whether the item is still in progress (workspace or workflow)
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Workspace | Self::Workflow)
    }
}

impl std::fmt::Display for ItemStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Workspace => "workspace",
            Self::Workflow => "workflow",
            Self::Archived => "archived",
        };
        write!(f, "{}", name)
    }
}

/// Read access to item lifecycle stages.
///
/// Implementations MUST be thread-safe. `Ok(None)` means the item is not
/// findable; a storage failure MUST be reported as `Err`, never as `None`.
pub trait ItemStageLookup: Send + Sync {
    /// Look up the stage of an item
    fn stage_of(&self, item: &ItemId) -> Result<Option<ItemStage>, StorageError>;
}

/// In-memory item stage catalog.
#[derive(Debug, Default)]
pub struct ItemCatalog {
    stages: RwLock<HashMap<ItemId, ItemStage>>,
}

impl ItemCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or advance) the stage of an item.
    ///
    /// Returns the previous stage, if any.
    pub fn set_stage(&self, item: ItemId, stage: ItemStage) -> Result<Option<ItemStage>, StorageError> {
        let mut stages = self
            .stages
            .write()
            .map_err(|_| StorageError::lock_poisoned("item catalog"))?;
        let previous = stages.insert(item, stage);
        debug!(item_id = %item, stage = %stage, previous = ?previous, "Item stage recorded");
        Ok(previous)
    }

    /// Forget an item, e.g. after it was deleted.
    pub fn remove(&self, item: &ItemId) -> Result<Option<ItemStage>, StorageError> {
        let mut stages = self
            .stages
            .write()
            .map_err(|_| StorageError::lock_poisoned("item catalog"))?;
        Ok(stages.remove(item))
    }
}

impl ItemStageLookup for ItemCatalog {
    fn stage_of(&self, item: &ItemId) -> Result<Option<ItemStage>, StorageError> {
        let stages = self
            .stages
            .read()
            .map_err(|_| StorageError::lock_poisoned("item catalog"))?;
        Ok(stages.get(item).copied())
    }
}

/// Which item stages make a version eligible as the "current" version.
///
/// The default only accepts archived items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentVersionPolicy {
    eligible_stages: Vec<ItemStage>,
}

impl CurrentVersionPolicy {
    /// Create a policy accepting the given stages
    pub fn new(eligible_stages: impl IntoIterator<Item = ItemStage>) -> Self {
        let mut stages: Vec<ItemStage> = Vec::new();
        for stage in eligible_stages {
            if !stages.contains(&stage) {
                stages.push(stage);
            }
        }
        Self {
            eligible_stages: stages,
        }
    }

    /// Policy that only accepts archived items
    pub fn archived_only() -> Self {
        Self::new([ItemStage::Archived])
    }

    /// Whether a version whose item has `stage` is eligible
    pub fn is_eligible(&self, stage: Option<ItemStage>) -> bool {
        match stage {
            Some(stage) => self.eligible_stages.contains(&stage),
            None => false,
        }
    }

    /// The stages this policy accepts
    pub fn eligible_stages(&self) -> &[ItemStage] {
        &self.eligible_stages
    }
}

impl Default for CurrentVersionPolicy {
    fn default() -> Self {
        Self::archived_only()
    }
}
