//! Principals and write authorization.
//!
//! Authentication resolves a bearer token to a [`Principal`]; authorization
//! then decides whether that principal may perform a given write. Both
//! happen here, in the HTTP layer, before any core operation is called.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use lineage_core::BundleId;
use secrecy::ExposeSecret;
use tracing::debug;

use crate::config::AuthConfig;

#[cfg(test)]
#[path = "authorization_tests.rs"]
mod tests;

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Display name of the principal
    pub name: String,

    /// Administrators may perform every write
    pub is_admin: bool,
}

/// Decides which principals exist and what they may modify.
///
/// # Thread Safety
/// Implementations are shared across all request handlers and must be
/// `Send + Sync`.
#[async_trait]
pub trait WriteAuthorizer: Send + Sync {
    /// Resolve a bearer token. `None` means the token is unknown.
    async fn resolve_principal(&self, token: &str) -> Option<Principal>;

    /// Whether the principal may change the primary bitstream of a bundle
    async fn may_modify_bundle(&self, principal: &Principal, bundle: BundleId) -> bool;

    /// Whether the principal may remove versions
    async fn may_manage_versions(&self, principal: &Principal) -> bool;
}

/// Authorizer backed by the `[auth]` configuration section.
///
/// Administrators may do everything. Other principals may modify only the
/// bundles granted to them and may not manage versions.
#[derive(Debug, Default)]
pub struct ConfiguredAuthorizer {
    principals: HashMap<String, Principal>,
    grants: HashMap<String, HashSet<BundleId>>,
}

impl ConfiguredAuthorizer {
    /// Create an authorizer that knows no principals
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an authorizer from configuration
    pub fn from_config(config: &AuthConfig) -> Self {
        config
            .principals
            .iter()
            .fold(Self::new(), |authorizer, entry| {
                let token = entry.token.expose_secret();
                if entry.admin {
                    authorizer.with_admin(&entry.name, token)
                } else {
                    authorizer.with_editor(&entry.name, token, entry.bundles.iter().copied())
                }
            })
    }

    /// Register an administrator
    pub fn with_admin(mut self, name: &str, token: &str) -> Self {
        self.principals.insert(
            token.to_string(),
            Principal {
                name: name.to_string(),
                is_admin: true,
            },
        );
        self
    }

    /// Register a principal that may modify the given bundles
    pub fn with_editor(
        mut self,
        name: &str,
        token: &str,
        bundles: impl IntoIterator<Item = BundleId>,
    ) -> Self {
        self.principals.insert(
            token.to_string(),
            Principal {
                name: name.to_string(),
                is_admin: false,
            },
        );
        self.grants
            .entry(name.to_string())
            .or_default()
            .extend(bundles);
        self
    }
}

#[async_trait]
impl WriteAuthorizer for ConfiguredAuthorizer {
    async fn resolve_principal(&self, token: &str) -> Option<Principal> {
        self.principals.get(token).cloned()
    }

    async fn may_modify_bundle(&self, principal: &Principal, bundle: BundleId) -> bool {
        let allowed = principal.is_admin
            || self
                .grants
                .get(&principal.name)
                .is_some_and(|bundles| bundles.contains(&bundle));

        debug!(principal = %principal.name, bundle_id = %bundle, allowed, "Bundle write authorization");
        allowed
    }

    async fn may_manage_versions(&self, principal: &Principal) -> bool {
        principal.is_admin
    }
}
