//! Error types for the auto-assigner persistence layer.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level result type for auto-assigner operations.
pub type Result<T> = std::result::Result<T, AssignerError>;

/// Top-level error type for the auto-assigner.
///
/// Absence of data is never an error here: a missing optional directory is
/// `None`, and a results file from another server instance reads as empty.
#[derive(Debug, Error)]
pub enum AssignerError {
    #[error("artifact directory {} does not exist for build {build_id}", .path.display())]
    HostDirectoryMissing { build_id: u64, path: PathBuf },

    #[error("invalid record for test '{test_name_id}': {reason}")]
    InvalidRecord {
        test_name_id: String,
        reason: String,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
