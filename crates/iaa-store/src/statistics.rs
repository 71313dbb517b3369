//! Plugin usage statistics, kept in memory and flushed to a versioned JSON file.
//!
//! The file lives in the host's plugin data directory:
//! `<plugin data dir>/investigationsAutoAssigner/statistics.json`.
//! A file with another version, or one that does not parse, is discarded
//! and counting starts from zero.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use iaa_core::error::{AssignerError, Result};

use crate::fsutil::write_atomic;
use crate::paths::PLUGIN_ARTIFACTS_DIR;

/// Name of the statistics file inside the plugin data directory.
pub const STATISTICS_FILE_NAME: &str = "statistics.json";

/// Version written to, and required from, the statistics file.
pub const STATISTICS_FILE_VERSION: &str = "1.6";

/// Counters tracked by the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatisticsKey {
    ShownButtonsCount,
    ClickedButtonsCount,
    AssignedInvestigationsCount,
    WrongInvestigationsCount,
    BuildWithSuggestionsCount,
    SavedSuggestionsCount,
}

/// A snapshot of all counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    version: String,
    #[serde(default)]
    values: BTreeMap<StatisticsKey, u64>,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            version: STATISTICS_FILE_VERSION.to_string(),
            values: BTreeMap::new(),
        }
    }
}

impl Statistics {
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn get(&self, key: StatisticsKey) -> u64 {
        self.values.get(&key).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, key: StatisticsKey) {
        self.increase(key, 1);
    }

    pub fn increase(&mut self, key: StatisticsKey, delta: u64) {
        let value = self.values.entry(key).or_insert(0);
        *value = value.saturating_add(delta);
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "version: {}, shownButtonsCount: {}, clickedButtonsCount: {}, \
             assignedInvestigationsCount: {}, wrongInvestigationsCount: {}, \
             buildWithSuggestionsCount: {}, savedSuggestionsCount: {}",
            self.version,
            self.get(StatisticsKey::ShownButtonsCount),
            self.get(StatisticsKey::ClickedButtonsCount),
            self.get(StatisticsKey::AssignedInvestigationsCount),
            self.get(StatisticsKey::WrongInvestigationsCount),
            self.get(StatisticsKey::BuildWithSuggestionsCount),
            self.get(StatisticsKey::SavedSuggestionsCount),
        )
    }
}

/// Reads and writes the statistics file.
///
/// Remembers what is on disk so that writing unchanged statistics is a no-op.
#[derive(Debug)]
pub struct StatisticsStore {
    dir: PathBuf,
    path: PathBuf,
    on_disk: Statistics,
}

impl StatisticsStore {
    pub fn new(plugin_data_dir: &Path) -> Self {
        let dir = plugin_data_dir.join(PLUGIN_ARTIFACTS_DIR);
        let path = dir.join(STATISTICS_FILE_NAME);
        Self {
            dir,
            path,
            on_disk: Statistics::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load statistics from disk.
    ///
    /// A missing file, invalid JSON, or a version other than
    /// [`STATISTICS_FILE_VERSION`] all yield fresh statistics.
    ///
    /// # Errors
    ///
    /// Returns [`AssignerError::Io`] if the file exists but cannot be read.
    pub fn read(&mut self) -> Result<Statistics> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.on_disk = Statistics::default();
                return Ok(self.on_disk.clone());
            }
            Err(e) => return Err(e.into()),
        };

        self.on_disk = match serde_json::from_str::<Statistics>(&content) {
            Ok(stats) if stats.version == STATISTICS_FILE_VERSION => stats,
            Ok(stats) => {
                warn!(
                    path = %self.path.display(),
                    version = %stats.version,
                    "discarding statistics with unsupported version"
                );
                Statistics::default()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable statistics");
                Statistics::default()
            }
        };
        Ok(self.on_disk.clone())
    }

    /// Persist `stats`, unless they equal what was last read or written.
    ///
    /// # Errors
    ///
    /// Returns [`AssignerError::Serialization`] if encoding fails and
    /// [`AssignerError::Io`] if the directory or file cannot be written.
    pub fn write(&mut self, stats: &Statistics) -> Result<()> {
        if &self.on_disk == stats {
            return Ok(());
        }

        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(stats)
            .map_err(|e| AssignerError::Serialization(e.to_string()))?;
        write_atomic(&self.path, json.as_bytes())?;

        debug!(path = %self.path.display(), "saved statistics");
        self.on_disk = stats.clone();
        Ok(())
    }
}

struct ReporterState {
    store: StatisticsStore,
    stats: Statistics,
}

/// Thread-safe accumulator for usage counters.
pub struct StatisticsReporter {
    state: Mutex<ReporterState>,
    enabled: bool,
}

impl StatisticsReporter {
    /// Load existing statistics from `store` and start counting on top of them.
    ///
    /// When `enabled` is false, counters still accumulate in memory but
    /// [`save`](Self::save) never touches the disk.
    ///
    /// # Errors
    ///
    /// Returns [`AssignerError::Io`] if existing statistics cannot be read.
    pub fn new(mut store: StatisticsStore, enabled: bool) -> Result<Self> {
        let stats = store.read()?;
        Ok(Self {
            state: Mutex::new(ReporterState { store, stats }),
            enabled,
        })
    }

    /// A reporter that never persists, for hosts without a data directory.
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(ReporterState {
                store: StatisticsStore::new(Path::new("")),
                stats: Statistics::default(),
            }),
            enabled: false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReporterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn report_shown_button(&self) {
        self.lock().stats.increment(StatisticsKey::ShownButtonsCount);
    }

    pub fn report_clicked_button(&self) {
        self.lock().stats.increment(StatisticsKey::ClickedButtonsCount);
    }

    pub fn report_assigned_investigations(&self, count: u64) {
        self.lock()
            .stats
            .increase(StatisticsKey::AssignedInvestigationsCount, count);
    }

    pub fn report_wrong_investigation(&self, count: u64) {
        self.lock()
            .stats
            .increase(StatisticsKey::WrongInvestigationsCount, count);
    }

    pub fn report_build_with_suggestions(&self) {
        self.lock()
            .stats
            .increment(StatisticsKey::BuildWithSuggestionsCount);
    }

    pub fn report_saved_suggestions(&self, count: u64) {
        self.lock()
            .stats
            .increase(StatisticsKey::SavedSuggestionsCount, count);
    }

    pub fn snapshot(&self) -> Statistics {
        self.lock().stats.clone()
    }

    /// Flush counters to disk if persistence is enabled.
    ///
    /// # Errors
    ///
    /// Propagates [`StatisticsStore::write`] failures.
    pub fn save(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut state = self.lock();
        let ReporterState { store, stats } = &mut *state;
        store.write(stats)
    }

    pub fn generate_report(&self) -> String {
        let state = self.lock();
        let stats = &state.stats;
        format!(
            "Short statistics of plugin usage:\n\
             {} investigations assigned;\n\
             {} of them were wrong;\n\
             {} shown suggestions;\n\
             {} of assignments from them;\n\
             {} suggestions saved in {} builds.\n",
            stats.get(StatisticsKey::AssignedInvestigationsCount),
            stats.get(StatisticsKey::WrongInvestigationsCount),
            stats.get(StatisticsKey::ShownButtonsCount),
            stats.get(StatisticsKey::ClickedButtonsCount),
            stats.get(StatisticsKey::SavedSuggestionsCount),
            stats.get(StatisticsKey::BuildWithSuggestionsCount),
        )
    }
}
