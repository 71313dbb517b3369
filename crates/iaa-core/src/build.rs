//! Build handle: the host's view of a single build.

use std::path::PathBuf;

/// What the host build server exposes about a build.
pub trait BuildHandle {
    /// Host-assigned build id, used in log lines and errors.
    fn build_id(&self) -> u64;

    /// Per-build artifacts directory owned by the host.
    fn artifacts_directory(&self) -> PathBuf;
}

/// A build known only by its id and artifacts directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactsBuild {
    id: u64,
    artifacts_dir: PathBuf,
}

impl ArtifactsBuild {
    pub fn new(id: u64, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            id,
            artifacts_dir: artifacts_dir.into(),
        }
    }
}

impl BuildHandle for ArtifactsBuild {
    fn build_id(&self) -> u64 {
        self.id
    }

    fn artifacts_directory(&self) -> PathBuf {
        self.artifacts_dir.clone()
    }
}

impl<T: BuildHandle + ?Sized> BuildHandle for &T {
    fn build_id(&self) -> u64 {
        (**self).build_id()
    }

    fn artifacts_directory(&self) -> PathBuf {
        (**self).artifacts_directory()
    }
}
