//! Record domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

/// A named, independently timestamped slice of a record's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    BibData,
    NonbibData,
    OrcidClaims,
    Metrics,
    Fulltext,
    Augments,
}

impl FragmentKind {
    pub const ALL: [FragmentKind; 6] = [
        FragmentKind::BibData,
        FragmentKind::NonbibData,
        FragmentKind::OrcidClaims,
        FragmentKind::Metrics,
        FragmentKind::Fulltext,
        FragmentKind::Augments,
    ];

    /// Storage column name of the fragment payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::BibData => "bib_data",
            FragmentKind::NonbibData => "nonbib_data",
            FragmentKind::OrcidClaims => "orcid_claims",
            FragmentKind::Metrics => "metrics",
            FragmentKind::Fulltext => "fulltext",
            FragmentKind::Augments => "augments",
        }
    }

    /// Storage column name of the fragment timestamp.
    pub fn updated_column(&self) -> &'static str {
        match self {
            FragmentKind::BibData => "bib_data_updated",
            FragmentKind::NonbibData => "nonbib_data_updated",
            FragmentKind::OrcidClaims => "orcid_claims_updated",
            FragmentKind::Metrics => "metrics_updated",
            FragmentKind::Fulltext => "fulltext_updated",
            FragmentKind::Augments => "augments_updated",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FragmentKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bib_data" | "metadata" => Ok(FragmentKind::BibData),
            "nonbib_data" | "nonbib_records" => Ok(FragmentKind::NonbibData),
            "orcid_claims" => Ok(FragmentKind::OrcidClaims),
            "metrics" | "metrics_records" => Ok(FragmentKind::Metrics),
            "fulltext" => Ok(FragmentKind::Fulltext),
            "augments" | "augment" => Ok(FragmentKind::Augments),
            other => Err(ValidationError::UnknownKind(other.to_string())),
        }
    }
}

/// One of the downstream systems a record is published to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    SearchIndex,
    Metrics,
    Links,
}

impl Target {
    /// Storage column holding the last published fingerprint.
    pub fn checksum_column(&self) -> &'static str {
        match self {
            Target::SearchIndex => "solr_checksum",
            Target::Metrics => "metrics_checksum",
            Target::Links => "datalinks_checksum",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::SearchIndex => f.write_str("search-index"),
            Target::Metrics => f.write_str("metrics"),
            Target::Links => f.write_str("links"),
        }
    }
}

/// Canonical per-record state held by the record store.
///
/// Fragment payloads are opaque JSON. A fragment whose payload was cleared keeps
/// its timestamp, so readiness still sees it as having arrived.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub id: Option<i64>,
    pub bibcode: String,

    pub bib_data: Option<Value>,
    pub bib_data_updated: Option<DateTime<Utc>>,
    pub nonbib_data: Option<Value>,
    pub nonbib_data_updated: Option<DateTime<Utc>>,
    pub orcid_claims: Option<Value>,
    pub orcid_claims_updated: Option<DateTime<Utc>>,
    pub metrics: Option<Value>,
    pub metrics_updated: Option<DateTime<Utc>>,
    pub fulltext: Option<Value>,
    pub fulltext_updated: Option<DateTime<Utc>>,
    pub augments: Option<Value>,
    pub augments_updated: Option<DateTime<Utc>>,

    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub processed: Option<DateTime<Utc>>,

    pub solr_checksum: Option<String>,
    pub metrics_checksum: Option<String>,
    pub datalinks_checksum: Option<String>,
}

impl Record {
    pub fn new(bibcode: impl Into<String>) -> Self {
        Self {
            bibcode: bibcode.into(),
            ..Default::default()
        }
    }

    pub fn fragment(&self, kind: FragmentKind) -> Option<&Value> {
        match kind {
            FragmentKind::BibData => self.bib_data.as_ref(),
            FragmentKind::NonbibData => self.nonbib_data.as_ref(),
            FragmentKind::OrcidClaims => self.orcid_claims.as_ref(),
            FragmentKind::Metrics => self.metrics.as_ref(),
            FragmentKind::Fulltext => self.fulltext.as_ref(),
            FragmentKind::Augments => self.augments.as_ref(),
        }
    }

    pub fn fragment_updated(&self, kind: FragmentKind) -> Option<DateTime<Utc>> {
        match kind {
            FragmentKind::BibData => self.bib_data_updated,
            FragmentKind::NonbibData => self.nonbib_data_updated,
            FragmentKind::OrcidClaims => self.orcid_claims_updated,
            FragmentKind::Metrics => self.metrics_updated,
            FragmentKind::Fulltext => self.fulltext_updated,
            FragmentKind::Augments => self.augments_updated,
        }
    }

    /// Replaces one fragment and stamps it with `at`. Other fragments are untouched.
    pub fn set_fragment(&mut self, kind: FragmentKind, payload: Option<Value>, at: DateTime<Utc>) {
        let (slot, stamp) = match kind {
            FragmentKind::BibData => (&mut self.bib_data, &mut self.bib_data_updated),
            FragmentKind::NonbibData => (&mut self.nonbib_data, &mut self.nonbib_data_updated),
            FragmentKind::OrcidClaims => (&mut self.orcid_claims, &mut self.orcid_claims_updated),
            FragmentKind::Metrics => (&mut self.metrics, &mut self.metrics_updated),
            FragmentKind::Fulltext => (&mut self.fulltext, &mut self.fulltext_updated),
            FragmentKind::Augments => (&mut self.augments, &mut self.augments_updated),
        };
        *slot = payload;
        *stamp = Some(at);
        self.updated = Some(at);
    }

    pub fn checksum(&self, target: Target) -> Option<&str> {
        match target {
            Target::SearchIndex => self.solr_checksum.as_deref(),
            Target::Metrics => self.metrics_checksum.as_deref(),
            Target::Links => self.datalinks_checksum.as_deref(),
        }
    }

    pub fn set_checksum(&mut self, target: Target, checksum: Option<String>) {
        match target {
            Target::SearchIndex => self.solr_checksum = checksum,
            Target::Metrics => self.metrics_checksum = checksum,
            Target::Links => self.datalinks_checksum = checksum,
        }
    }

    /// Returns a copy carrying only the payloads selected by `fields`.
    ///
    /// Key, timestamps and checksums are always kept.
    pub fn project(&self, fields: &RecordFields) -> Record {
        let mut projected = self.clone();
        for kind in FragmentKind::ALL {
            if !fields.includes(kind) {
                match kind {
                    FragmentKind::BibData => projected.bib_data = None,
                    FragmentKind::NonbibData => projected.nonbib_data = None,
                    FragmentKind::OrcidClaims => projected.orcid_claims = None,
                    FragmentKind::Metrics => projected.metrics = None,
                    FragmentKind::Fulltext => projected.fulltext = None,
                    FragmentKind::Augments => projected.augments = None,
                }
            }
        }
        projected
    }

    /// Compact summary of fragment timestamps for log lines.
    pub fn timestamps_summary(&self) -> String {
        fn fmt_ts(ts: Option<DateTime<Utc>>) -> String {
            ts.map(|t| t.to_rfc3339()).unwrap_or_else(|| "None".to_string())
        }
        format!(
            "metadata={}, orcid={}, nonbib={}, fulltext={}, metrics={}, augments={}",
            fmt_ts(self.bib_data_updated),
            fmt_ts(self.orcid_claims_updated),
            fmt_ts(self.nonbib_data_updated),
            fmt_ts(self.fulltext_updated),
            fmt_ts(self.metrics_updated),
            fmt_ts(self.augments_updated),
        )
    }
}

/// Selects which fragment payloads a record load should materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFields {
    pub bib_data: bool,
    pub nonbib_data: bool,
    pub orcid_claims: bool,
    pub metrics: bool,
    pub fulltext: bool,
    pub augments: bool,
}

impl RecordFields {
    pub fn all() -> Self {
        Self {
            bib_data: true,
            nonbib_data: true,
            orcid_claims: true,
            metrics: true,
            fulltext: true,
            augments: true,
        }
    }

    /// Key, timestamps and checksums only.
    pub fn none() -> Self {
        Self {
            bib_data: false,
            nonbib_data: false,
            orcid_claims: false,
            metrics: false,
            fulltext: false,
            augments: false,
        }
    }

    /// Payloads needed to build the payloads of the enabled targets.
    ///
    /// The search-index document draws on every fragment, so enabling it loads
    /// everything.
    pub fn for_targets(update_index: bool, update_metrics: bool, update_links: bool) -> Self {
        if update_index {
            return Self::all();
        }
        let mut fields = Self::none();
        if update_metrics {
            fields.metrics = true;
        }
        if update_links {
            fields.bib_data = true;
            fields.nonbib_data = true;
        }
        fields
    }

    pub fn includes(&self, kind: FragmentKind) -> bool {
        match kind {
            FragmentKind::BibData => self.bib_data,
            FragmentKind::NonbibData => self.nonbib_data,
            FragmentKind::OrcidClaims => self.orcid_claims,
            FragmentKind::Metrics => self.metrics,
            FragmentKind::Fulltext => self.fulltext,
            FragmentKind::Augments => self.augments,
        }
    }
}

impl Default for RecordFields {
    fn default() -> Self {
        Self::all()
    }
}
