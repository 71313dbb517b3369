//! TOML configuration for the auto-assigner.
//!
//! ```toml
//! server_uuid = "239-239-239"
//! plugin_data_dir = "/var/lib/buildserver/plugin-data"
//! statistics_enabled = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AssignerError;
use crate::identity::ServerIdentity;

/// Runtime configuration supplied by the host installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignerConfig {
    /// Identity of this server installation. Results files written under a
    /// different identity are ignored on read.
    pub server_uuid: String,

    /// Root of the host's plugin data directory. Statistics live under it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_data_dir: Option<PathBuf>,

    /// Whether usage statistics are persisted to disk.
    #[serde(default)]
    pub statistics_enabled: bool,
}

impl AssignerConfig {
    pub fn new(server_uuid: impl Into<String>) -> Self {
        Self {
            server_uuid: server_uuid.into(),
            plugin_data_dir: None,
            statistics_enabled: false,
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`AssignerError::Io`] if the file cannot be read and
    /// [`AssignerError::Config`] if it is not valid configuration.
    pub fn load(path: &Path) -> Result<Self, AssignerError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`AssignerError::Config`] on malformed TOML, missing
    /// `server_uuid`, or a blank `server_uuid`.
    pub fn from_toml_str(content: &str) -> Result<Self, AssignerError> {
        let config: Self =
            toml::from_str(content).map_err(|e| AssignerError::Config(e.to_string()))?;
        if config.server_uuid.trim().is_empty() {
            return Err(AssignerError::Config(
                "server_uuid must not be empty".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn server_identity(&self) -> ServerIdentity {
        ServerIdentity::new(self.server_uuid.clone())
    }
}
