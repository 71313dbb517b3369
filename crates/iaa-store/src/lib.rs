//! # iaa-store
//!
//! Persistence for the investigations auto-assigner.
//!
//! Suggestions live as a small text file inside each build's artifacts,
//! next to the host's own artifacts. The file is authoritative only for the
//! server installation that wrote it.
//!
//! - [`ArtifactPathResolver`]: where a build's suggestions file lives
//! - [`SuggestionsStore`]: identity-guarded read/write of that file
//! - [`SuggestionsArtifact`]: append and lookup on top of both
//! - [`StatisticsReporter`]: usage counters persisted in the plugin data dir

pub mod artifact;
mod fsutil;
pub mod paths;
pub mod statistics;
pub mod suggestions;

pub use artifact::{AppendOutcome, SuggestionsArtifact};
pub use paths::ArtifactPathResolver;
pub use statistics::{Statistics, StatisticsKey, StatisticsReporter, StatisticsStore};
pub use suggestions::SuggestionsStore;
