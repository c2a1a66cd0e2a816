use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SitemapAction {
    /// Flag records whose metadata changed since their file was generated.
    Add,
    /// Flag every given record.
    ForceUpdate,
    /// Accepted but not acted upon.
    Remove,
    /// Empty the table and back up existing sitemap files.
    DeleteTable,
}

impl SitemapAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SitemapAction::Add => "add",
            SitemapAction::ForceUpdate => "force-update",
            SitemapAction::Remove => "remove",
            SitemapAction::DeleteTable => "delete-table",
        }
    }
}

impl fmt::Display for SitemapAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SitemapAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(SitemapAction::Add),
            "force-update" => Ok(SitemapAction::ForceUpdate),
            "remove" => Ok(SitemapAction::Remove),
            "delete-table" => Ok(SitemapAction::DeleteTable),
            other => Err(ValidationError::InvalidInput(format!(
                "unknown sitemap action '{}'",
                other
            ))),
        }
    }
}

/// Sitemap bookkeeping row of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapInfo {
    pub id: Option<i64>,
    pub record_id: i64,
    pub bibcode: String,
    pub bib_data_updated: Option<DateTime<Utc>>,
    pub filename_lastmoddate: Option<DateTime<Utc>>,
    pub sitemap_filename: Option<String>,
    pub update_flag: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapPopulationReport {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
    /// Keys that got a new sitemap row.
    pub created: Vec<String>,
}
