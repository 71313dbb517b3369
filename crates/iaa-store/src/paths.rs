//! Location of the suggestions file inside a build's artifacts.
//!
//! Layout:
//! ```text
//! <artifacts dir>/.teamcity/investigationsAutoAssigner/suggestions.txt
//! ```
//!
//! `.teamcity` belongs to the host: its absence means the build has no
//! artifact storage we may use, and we never create it. The plugin directory
//! below it is ours and is created on demand.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use iaa_core::build::BuildHandle;
use iaa_core::error::{AssignerError, Result};

/// Host-owned directory inside every build's artifacts directory.
pub const HOST_ARTIFACTS_DIR: &str = ".teamcity";

/// Plugin-owned directory below [`HOST_ARTIFACTS_DIR`].
pub const PLUGIN_ARTIFACTS_DIR: &str = "investigationsAutoAssigner";

/// Name of the suggestions file inside [`PLUGIN_ARTIFACTS_DIR`].
pub const SUGGESTIONS_FILE_NAME: &str = "suggestions.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    /// Create the plugin directory if it is missing.
    Create,
    /// Stop at the first missing directory.
    Inspect,
}

/// Derives the suggestions file path for a build.
///
/// Stateless: the path is recomputed from the build handle on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactPathResolver;

impl ArtifactPathResolver {
    pub fn new() -> Self {
        Self
    }

    /// Path of the suggestions file, creating the plugin directory if needed.
    ///
    /// The file itself is not created.
    ///
    /// # Errors
    ///
    /// Returns [`AssignerError::HostDirectoryMissing`] if the host artifacts
    /// directory does not exist, and [`AssignerError::Io`] if the plugin
    /// directory cannot be created.
    pub fn resolve(&self, build: &dyn BuildHandle) -> Result<PathBuf> {
        match self.walk(build, Walk::Create)? {
            Some(path) => Ok(path),
            None => Err(AssignerError::HostDirectoryMissing {
                build_id: build.build_id(),
                path: build.artifacts_directory().join(HOST_ARTIFACTS_DIR),
            }),
        }
    }

    /// Path of the suggestions file if its directory already exists.
    ///
    /// Creates nothing. Returns `None` as soon as a directory on the way is
    /// missing. The file itself does not have to exist.
    pub fn resolve_if_exists(&self, build: &dyn BuildHandle) -> Option<PathBuf> {
        // Inspect never touches the filesystem beyond existence checks.
        self.walk(build, Walk::Inspect).ok().flatten()
    }

    fn walk(&self, build: &dyn BuildHandle, mode: Walk) -> Result<Option<PathBuf>> {
        let host_dir = build.artifacts_directory().join(HOST_ARTIFACTS_DIR);
        if !host_dir.is_dir() {
            debug!(
                build_id = build.build_id(),
                path = %host_dir.display(),
                "host artifacts directory does not exist; skipping suggestions"
            );
            return Ok(None);
        }

        let plugin_dir = host_dir.join(PLUGIN_ARTIFACTS_DIR);
        if !plugin_dir.is_dir() {
            match mode {
                Walk::Inspect => return Ok(None),
                Walk::Create => {
                    // create_dir_all tolerates a concurrent creator.
                    fs::create_dir_all(&plugin_dir)?;
                    debug!(
                        build_id = build.build_id(),
                        path = %plugin_dir.display(),
                        "created plugin artifacts directory"
                    );
                }
            }
        }

        Ok(Some(plugin_dir.join(SUGGESTIONS_FILE_NAME)))
    }
}
