//! Configuration loading for the API server.
//!
//! The configuration is stored in TOML format. Its path is taken from the
//! `LINEAGE_CONFIG` environment variable; without it the defaults apply.
//! `API_HOST` and `API_PORT` override the `[server]` section.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use lineage_core::{BundleId, VersioningSettings};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::server::ApiConfig;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_VAR: &str = "LINEAGE_CONFIG";

/// Environment variable overriding the bind host
pub const HOST_VAR: &str = "API_HOST";

/// Environment variable overriding the port
pub const PORT_VAR: &str = "API_PORT";

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path:?}")]
    NotFound { path: PathBuf },

    #[error("Failed to read configuration file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
}

/// Complete server configuration.
///
/// # Example TOML Configuration
///
/// ```toml
/// [server]
/// host = "127.0.0.1"
/// port = 8080
/// request_timeout_secs = 30
///
/// [versioning]
/// enabled = true
/// current_version_stages = ["archived"]
///
/// [[auth.principals]]
/// name = "admin"
/// token = "change-me"
/// admin = true
///
/// [[auth.principals]]
/// name = "curator"
/// token = "curator-token"
/// bundles = ["5f0c3bd0-4f2e-4a56-9a51-7bd6a4b8a3c1"]
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Listener settings
    #[serde(default)]
    pub server: ApiConfig,

    /// Versioning subsystem settings
    #[serde(default)]
    pub versioning: VersioningSettings,

    /// Principals allowed to write
    #[serde(default)]
    pub auth: AuthConfig,
}

/// The `[auth]` section
#[derive(Debug, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub principals: Vec<PrincipalConfig>,
}

/// One principal that may authenticate with a bearer token
#[derive(Debug, Deserialize)]
pub struct PrincipalConfig {
    pub name: String,

    pub token: SecretString,

    /// Administrators may perform every write
    #[serde(default)]
    pub admin: bool,

    /// Bundles a non-administrator may modify
    #[serde(default)]
    pub bundles: Vec<BundleId>,
}

impl AppConfig {
    /// Loads configuration from a TOML file at the specified path.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The specified file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML or does not match the schema
    /// - The versioning page sizes are inconsistent
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading configuration from {:?}", path);

        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot honour
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.versioning
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                name: "versioning".to_string(),
                value: format!(
                    "default_page_size = {}, max_page_size = {}",
                    self.versioning.default_page_size, self.versioning.max_page_size
                ),
                reason: e.to_string(),
            })
    }

    /// Loads configuration the way the server binary does.
    ///
    /// Reads the file named by `LINEAGE_CONFIG` when set, then applies the
    /// `API_HOST`/`API_PORT` overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var_os(CONFIG_PATH_VAR) {
            Some(path) => {
                let config = Self::load(Path::new(&path))?;
                info!("Configuration loaded from {:?}", path);
                config
            }
            None => {
                info!("{} not set, using default configuration", CONFIG_PATH_VAR);
                Self::default()
            }
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `API_HOST` and `API_PORT` on top of the loaded values
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = env::var(HOST_VAR) {
            self.server.host = host;
        }

        if let Ok(port) = env::var(PORT_VAR) {
            self.server.port = port.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    name: PORT_VAR.to_string(),
                    value: port.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        Ok(())
    }
}
