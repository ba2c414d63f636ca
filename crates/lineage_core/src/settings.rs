//! Versioning settings shared by the store and its callers.

use serde::{Deserialize, Serialize};

use crate::item_stage::{CurrentVersionPolicy, ItemStage};
use crate::errors::{VersioningError, VersioningResult};
use crate::pagination::{PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;

/// Settings of the versioning subsystem.
///
/// # Example TOML
///
/// ```toml
/// [versioning]
/// enabled = true
/// current_version_stages = ["archived"]
/// default_page_size = 20
/// max_page_size = 1000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningSettings {
    /// Whether version histories are exposed at all
    pub enabled: bool,

    /// Item stages that make a version eligible as the current version
    pub current_version_stages: Vec<ItemStage>,

    /// Page size when the caller does not ask for one
    pub default_page_size: usize,

    /// Largest page size a caller may ask for
    pub max_page_size: usize,
}

impl VersioningSettings {
    /// The current-version policy described by these settings
    pub fn current_version_policy(&self) -> CurrentVersionPolicy {
        CurrentVersionPolicy::new(self.current_version_stages.iter().copied())
    }

    /// Check that the page sizes are usable.
    ///
    /// Both sizes must be at least one and the default may not exceed the
    /// maximum.
    pub fn validate(&self) -> VersioningResult<()> {
        if self.max_page_size == 0 {
            return Err(VersioningError::invalid_argument(
                "max_page_size",
                "must be at least 1",
            ));
        }

        if self.default_page_size == 0 {
            return Err(VersioningError::invalid_argument(
                "default_page_size",
                "must be at least 1",
            ));
        }

        if self.default_page_size > self.max_page_size {
            return Err(VersioningError::invalid_argument(
                "default_page_size",
                format!(
                    "{} exceeds max_page_size {}",
                    self.default_page_size, self.max_page_size
                ),
            ));
        }

        Ok(())
    }

    /// Build a page request from optional caller-supplied values.
    ///
    /// A missing page is the first page, a missing size is the configured
    /// default. A size of zero or above `max_page_size` is rejected.
    pub fn page_request(&self, page: Option<usize>, size: Option<usize>) -> VersioningResult<PageRequest> {
        PageRequest::with_limit(
            page.unwrap_or(0),
            size.unwrap_or(self.default_page_size),
            self.max_page_size,
        )
    }
}

impl Default for VersioningSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            current_version_stages: vec![ItemStage::Archived],
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}
