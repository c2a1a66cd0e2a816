use serde::{Deserialize, Serialize};

use crate::records::Target;

/// Per-key result of a downstream batch write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl WriteOutcome {
    pub fn all_succeeded(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            succeeded: keys.into_iter().collect(),
            failed: Vec::new(),
        }
    }

    pub fn all_failed(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            succeeded: Vec::new(),
            failed: keys.into_iter().collect(),
        }
    }

    pub fn merge(&mut self, other: WriteOutcome) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
    }
}

/// Result of one publish task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReport {
    pub target: Target,
    pub submitted: usize,
    pub written: usize,
    pub failed: Vec<String>,
    pub checksums_committed: usize,
}

impl PublishReport {
    pub fn empty(target: Target) -> Self {
        Self {
            target,
            submitted: 0,
            written: 0,
            failed: Vec::new(),
            checksums_committed: 0,
        }
    }
}
