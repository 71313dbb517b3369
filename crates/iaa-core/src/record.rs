//! Responsibility record: one persisted auto-assignment decision.

use serde::{Deserialize, Serialize};

/// "Test `test_name_id` was auto-assigned to `investigator_id` because `reason`."
///
/// All three values are opaque to the persistence layer. They are expected
/// to be free of line terminators; ids are also expected to be free of tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsibilityRecord {
    test_name_id: String,
    investigator_id: String,
    reason: String,
}

impl ResponsibilityRecord {
    pub fn new(
        test_name_id: impl Into<String>,
        investigator_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            test_name_id: test_name_id.into(),
            investigator_id: investigator_id.into(),
            reason: reason.into(),
        }
    }

    pub fn test_name_id(&self) -> &str {
        &self.test_name_id
    }

    pub fn investigator_id(&self) -> &str {
        &self.investigator_id
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}
