//! Identifier types
//!
//! Branded identifiers for every entity the core works with. Version
//! histories and versions use positive integer identifiers; items, bundles,
//! bitstreams and submitters use UUIDs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::VersioningError;

#[cfg(test)]
#[path = "identifiers_tests.rs"]
mod tests;

/// Parse a positive 32-bit integer identifier.
///
/// Non-numeric, zero and negative values are rejected with
/// `VersioningError::InvalidArgument` naming `field`.
fn parse_positive_id(field: &str, raw: &str) -> Result<i32, VersioningError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(VersioningError::invalid_argument(field, "identifier is missing"));
    }

    let value: i64 = trimmed.parse().map_err(|_| {
        VersioningError::invalid_argument(field, format!("'{}' is not a number", trimmed))
    })?;

    if value <= 0 {
        return Err(VersioningError::invalid_argument(
            field,
            format!("identifier must be positive, got {}", value),
        ));
    }

    i32::try_from(value).map_err(|_| {
        VersioningError::invalid_argument(field, format!("identifier {} is out of range", value))
    })
}

/// Identifier of a version history
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionHistoryId(i32);

impl VersionHistoryId {
    /// Create a version history ID from a raw value
    ///
    /// # Errors
    /// Returns `VersioningError::InvalidArgument` if the value is not positive
    pub fn new(value: i32) -> Result<Self, VersioningError> {
        if value <= 0 {
            return Err(VersioningError::invalid_argument(
                "version_history_id",
                format!("identifier must be positive, got {}", value),
            ));
        }
        Ok(Self(value))
    }

    /// Parse a version history ID from its textual form (e.g. a path segment)
    pub fn parse(raw: &str) -> Result<Self, VersioningError> {
        parse_positive_id("version_history_id", raw).map(Self)
    }

    /// Get the raw value
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for VersionHistoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a single version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionId(i32);

impl VersionId {
    /// Create a version ID from a raw value
    ///
    /// # Errors
    /// Returns `VersioningError::InvalidArgument` if the value is not positive
    pub fn new(value: i32) -> Result<Self, VersioningError> {
        if value <= 0 {
            return Err(VersioningError::invalid_argument(
                "version_id",
                format!("identifier must be positive, got {}", value),
            ));
        }
        Ok(Self(value))
    }

    /// Parse a version ID from its textual form
    pub fn parse(raw: &str) -> Result<Self, VersioningError> {
        parse_positive_id("version_id", raw).map(Self)
    }

    /// Get the raw value
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse an identifier from its textual UUID form
            ///
            /// # Errors
            /// Returns `VersioningError::InvalidArgument` if `raw` is not a UUID
            pub fn parse(raw: &str) -> Result<Self, VersioningError> {
                Uuid::parse_str(raw.trim()).map(Self).map_err(|_| {
                    VersioningError::invalid_argument(
                        $field,
                        format!("'{}' is not a valid UUID", raw.trim()),
                    )
                })
            }

            /// Get the UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self::from_uuid(uuid)
            }
        }
    };
}

uuid_identifier!(
    /// Identifier of an item (the content snapshot a version points at)
    ItemId,
    "item_id"
);

uuid_identifier!(
    /// Identifier of a bundle
    BundleId,
    "bundle_id"
);

uuid_identifier!(
    /// Identifier of a bitstream
    BitstreamId,
    "bitstream_id"
);

uuid_identifier!(
    /// Identifier of the person who submitted a version
    SubmitterId,
    "submitter_id"
);
