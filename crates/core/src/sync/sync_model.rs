use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::tasks::PublishOptions;

/// Options of one synchronize call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncOptions {
    /// Publish records that only have `bib_data`, and skip the staleness test.
    pub force: bool,
    #[serde(alias = "updateSolr")]
    pub update_index: bool,
    pub update_metrics: bool,
    pub update_links: bool,
    /// Publish even when the stored fingerprint matches.
    #[serde(alias = "ignoreChecksums")]
    pub ignore_fingerprints: bool,
    /// Search-index update URLs overriding the configured ones.
    #[serde(alias = "solrTargets")]
    pub index_targets: Option<Vec<String>>,
    pub commit: bool,
    pub update_processed: bool,
    pub priority: i32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            force: false,
            update_index: true,
            update_metrics: true,
            update_links: true,
            ignore_fingerprints: false,
            index_targets: None,
            commit: false,
            update_processed: true,
            priority: 0,
        }
    }
}

impl SyncOptions {
    /// Rebuild of the search index: every record with metadata is
    /// republished unconditionally, and nothing is marked processed.
    pub fn rebuild(index_targets: Option<Vec<String>>) -> Self {
        Self {
            force: true,
            update_index: true,
            update_metrics: false,
            update_links: false,
            ignore_fingerprints: true,
            index_targets,
            commit: false,
            update_processed: false,
            priority: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.update_index && !self.update_metrics && !self.update_links {
            return Err(Error::Config(
                "synchronize called with every target disabled".to_string(),
            ));
        }
        Ok(())
    }

    pub fn publish_options(&self) -> PublishOptions {
        PublishOptions {
            commit: self.commit,
            index_targets: self.index_targets.clone(),
            update_processed: self.update_processed,
            priority: self.priority,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCounts {
    pub search_index: usize,
    pub metrics: usize,
    pub links: usize,
}

/// Outcome counts of one synchronize call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub requested: usize,
    /// Distinct keys examined.
    pub processed: usize,
    pub missing: usize,
    pub not_ready: usize,
    pub stale: usize,
    /// Keys whose load failed.
    pub failed: usize,
    pub accumulated: TargetCounts,
    pub tasks_submitted: usize,
}
