//! Per-build suggestions artifact: the two operations the plugin performs.
//!
//! After heuristics run for a build, new suggestions are merged into the
//! build's file. When a later build needs to know whether a failing test
//! already has a suggestion, the earlier build's file is consulted.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use iaa_core::build::BuildHandle;
use iaa_core::error::Result;
use iaa_core::identity::ServerSettings;
use iaa_core::record::ResponsibilityRecord;

use crate::paths::ArtifactPathResolver;
use crate::statistics::StatisticsReporter;
use crate::suggestions::SuggestionsStore;

/// Result of [`SuggestionsArtifact::append_results`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AppendOutcome {
    /// Nothing to add; the file was not touched.
    Skipped,
    /// `added` new records were written ahead of the previous ones.
    Appended { added: usize, total: usize },
}

pub struct SuggestionsArtifact<S> {
    resolver: ArtifactPathResolver,
    store: SuggestionsStore<S>,
    statistics: Arc<StatisticsReporter>,
}

impl<S: ServerSettings> SuggestionsArtifact<S> {
    pub fn new(
        resolver: ArtifactPathResolver,
        store: SuggestionsStore<S>,
        statistics: Arc<StatisticsReporter>,
    ) -> Self {
        Self {
            resolver,
            store,
            statistics,
        }
    }

    pub fn store(&self) -> &SuggestionsStore<S> {
        &self.store
    }

    /// Merge `new_records` into the build's suggestions file.
    ///
    /// New records go first, followed by whatever the file already held for
    /// this server. The plugin directory is created if needed.
    ///
    /// # Errors
    ///
    /// Returns [`AssignerError::HostDirectoryMissing`] if the build has no
    /// host artifacts directory, and any read or write error of the store.
    /// The caller decides whether that is fatal; for the build pipeline it
    /// is not.
    ///
    /// [`AssignerError::HostDirectoryMissing`]: iaa_core::AssignerError::HostDirectoryMissing
    pub fn append_results(
        &self,
        build: &dyn BuildHandle,
        new_records: Vec<ResponsibilityRecord>,
    ) -> Result<AppendOutcome> {
        if new_records.is_empty() {
            return Ok(AppendOutcome::Skipped);
        }

        let added = new_records.len();
        self.statistics.report_saved_suggestions(added as u64);
        let path = self.resolver.resolve(build)?;

        let previous = self.store.read(&path)?;
        if previous.is_empty() {
            self.statistics.report_build_with_suggestions();
        }
        debug!(
            build_id = build.build_id(),
            count = previous.len(),
            "read previously added suggestions"
        );

        let mut merged = new_records;
        merged.extend(previous);
        self.store.write(&path, &merged)?;
        debug!(build_id = build.build_id(), count = added, "wrote new suggestions");

        Ok(AppendOutcome::Appended {
            added,
            total: merged.len(),
        })
    }

    /// The stored suggestion for `test_name_id` in `build`, if any.
    ///
    /// Never fails: a missing directory or file, a foreign file, or an I/O
    /// error all mean "no suggestion".
    pub fn find_for_test(
        &self,
        build: &dyn BuildHandle,
        test_name_id: &str,
    ) -> Option<ResponsibilityRecord> {
        let path = self.resolver.resolve_if_exists(build)?;
        let records = match self.store.read(&path) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    build_id = build.build_id(),
                    path = %path.display(),
                    error = %e,
                    "failed to read stored suggestions"
                );
                return None;
            }
        };

        let found = records
            .into_iter()
            .find(|record| record.test_name_id() == test_name_id);
        if found.is_none() {
            debug!(build_id = build.build_id(), test_name_id, "no stored suggestion for test");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::{HOST_ARTIFACTS_DIR, PLUGIN_ARTIFACTS_DIR, SUGGESTIONS_FILE_NAME};
    use crate::statistics::StatisticsKey;
    use iaa_core::build::ArtifactsBuild;
    use iaa_core::error::AssignerError;
    use iaa_core::identity::StaticServerSettings;
    use std::fs;

    fn artifact(uuid: &str) -> SuggestionsArtifact<StaticServerSettings> {
        SuggestionsArtifact::new(
            ArtifactPathResolver::new(),
            SuggestionsStore::new(StaticServerSettings::new(uuid)),
            Arc::new(StatisticsReporter::in_memory()),
        )
    }

    fn build_with_host_dir() -> (tempfile::TempDir, ArtifactsBuild) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(HOST_ARTIFACTS_DIR)).unwrap();
        let build = ArtifactsBuild::new(100, dir.path());
        (dir, build)
    }

    #[test]
    fn empty_append_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let build = ArtifactsBuild::new(1, dir.path());

        let outcome = artifact("uuid").append_results(&build, Vec::new()).unwrap();

        assert_eq!(outcome, AppendOutcome::Skipped);
        assert!(!dir.path().join(HOST_ARTIFACTS_DIR).exists());
    }

    #[test]
    fn append_without_host_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let build = ArtifactsBuild::new(1, dir.path());

        let err = artifact("uuid")
            .append_results(&build, vec![ResponsibilityRecord::new("1", "2", "r")])
            .unwrap_err();

        assert!(matches!(err, AssignerError::HostDirectoryMissing { .. }));
    }

    #[test]
    fn append_puts_new_records_before_previous() {
        let (dir, build) = build_with_host_dir();
        let artifact = artifact("uuid");

        let first = artifact
            .append_results(&build, vec![ResponsibilityRecord::new("111", "1", "first")])
            .unwrap();
        assert_eq!(first, AppendOutcome::Appended { added: 1, total: 1 });

        let second = artifact
            .append_results(
                &build,
                vec![
                    ResponsibilityRecord::new("112", "2", "second"),
                    ResponsibilityRecord::new("113", "3", "third"),
                ],
            )
            .unwrap();
        assert_eq!(second, AppendOutcome::Appended { added: 2, total: 3 });

        let path = dir
            .path()
            .join(HOST_ARTIFACTS_DIR)
            .join(PLUGIN_ARTIFACTS_DIR)
            .join(SUGGESTIONS_FILE_NAME);
        let ids: Vec<_> = artifact
            .store()
            .read(&path)
            .unwrap()
            .iter()
            .map(|r| r.test_name_id().to_string())
            .collect();
        assert_eq!(ids, ["112", "113", "111"]);
    }

    #[test]
    fn append_reports_statistics() {
        let (_dir, build) = build_with_host_dir();
        let statistics = Arc::new(StatisticsReporter::in_memory());
        let artifact = SuggestionsArtifact::new(
            ArtifactPathResolver::new(),
            SuggestionsStore::new(StaticServerSettings::new("uuid")),
            Arc::clone(&statistics),
        );

        for id in ["1", "2"] {
            artifact
                .append_results(&build, vec![ResponsibilityRecord::new(id, "7", "r")])
                .unwrap();
        }

        let stats = statistics.snapshot();
        assert_eq!(stats.get(StatisticsKey::SavedSuggestionsCount), 2);
        assert_eq!(stats.get(StatisticsKey::BuildWithSuggestionsCount), 1);
    }

    #[test]
    fn append_drops_records_from_another_server() {
        let (_dir, build) = build_with_host_dir();
        artifact("old-server")
            .append_results(&build, vec![ResponsibilityRecord::new("111", "1", "old")])
            .unwrap();

        let outcome = artifact("new-server")
            .append_results(&build, vec![ResponsibilityRecord::new("112", "2", "new")])
            .unwrap();

        assert_eq!(outcome, AppendOutcome::Appended { added: 1, total: 1 });
    }

    #[test]
    fn append_replaces_foreign_file_with_invalid_bytes() {
        let (dir, build) = build_with_host_dir();
        let plugin_dir = dir.path().join(HOST_ARTIFACTS_DIR).join(PLUGIN_ARTIFACTS_DIR);
        fs::create_dir(&plugin_dir).unwrap();
        let mut bytes = b"serverUUID\told-server\n111\t1\t".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        fs::write(plugin_dir.join(SUGGESTIONS_FILE_NAME), bytes).unwrap();

        let artifact = artifact("new-server");
        let outcome = artifact
            .append_results(&build, vec![ResponsibilityRecord::new("112", "2", "new")])
            .unwrap();

        assert_eq!(outcome, AppendOutcome::Appended { added: 1, total: 1 });
        assert_eq!(artifact.find_for_test(&build, "112").unwrap().reason(), "new");
    }

    #[test]
    fn find_for_test_returns_first_match() {
        let (_dir, build) = build_with_host_dir();
        let artifact = artifact("uuid");
        artifact
            .append_results(
                &build,
                vec![
                    ResponsibilityRecord::new("111", "1", "newest"),
                    ResponsibilityRecord::new("112", "2", "other"),
                    ResponsibilityRecord::new("111", "3", "older"),
                ],
            )
            .unwrap();

        let found = artifact.find_for_test(&build, "111").unwrap();
        assert_eq!(found.investigator_id(), "1");
        assert_eq!(found.reason(), "newest");
        assert!(artifact.find_for_test(&build, "999").is_none());
    }

    #[test]
    fn find_for_test_without_directories_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let build = ArtifactsBuild::new(1, dir.path());
        assert!(artifact("uuid").find_for_test(&build, "111").is_none());

        fs::create_dir(dir.path().join(HOST_ARTIFACTS_DIR)).unwrap();
        assert!(artifact("uuid").find_for_test(&build, "111").is_none());
        assert!(!dir
            .path()
            .join(HOST_ARTIFACTS_DIR)
            .join(PLUGIN_ARTIFACTS_DIR)
            .exists());
    }

    #[test]
    fn find_for_test_ignores_foreign_file() {
        let (_dir, build) = build_with_host_dir();
        artifact("old-server")
            .append_results(&build, vec![ResponsibilityRecord::new("111", "1", "r")])
            .unwrap();

        assert!(artifact("new-server").find_for_test(&build, "111").is_none());
    }
}
