use serde::{Deserialize, Serialize};

/// Outcome of one removal step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "camelCase")]
pub enum StepOutcome {
    Deleted,
    NotFound,
    Failed(String),
    /// The system is not configured.
    Skipped,
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub bibcode: String,
    pub record_store: StepOutcome,
    pub search_index: StepOutcome,
    pub metrics_store: StepOutcome,
}

impl DeletionReport {
    pub fn has_failures(&self) -> bool {
        self.record_store.is_failed()
            || self.search_index.is_failed()
            || self.metrics_store.is_failed()
    }
}
