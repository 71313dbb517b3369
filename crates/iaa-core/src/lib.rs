//! # iaa-core
//!
//! Core types for the investigations auto-assigner persistence layer.
//!
//! This crate defines the types shared by the other `iaa` crates:
//! - [`ResponsibilityRecord`]: one persisted auto-assignment decision
//! - [`ServerIdentity`] and [`ServerSettings`]: the per-installation identity guard
//! - [`BuildHandle`]: what the host build server tells us about a build
//! - Error hierarchy ([`AssignerError`])
//! - Configuration ([`AssignerConfig`])

pub mod build;
pub mod config;
pub mod error;
pub mod identity;
pub mod record;

pub use build::{ArtifactsBuild, BuildHandle};
pub use config::AssignerConfig;
pub use error::{AssignerError, Result};
pub use identity::{ServerIdentity, ServerSettings, StaticServerSettings};
pub use record::ResponsibilityRecord;
