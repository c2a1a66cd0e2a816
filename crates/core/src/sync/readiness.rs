//! Readiness gate.
//!
//! Decides from fragment timestamps alone whether a record carries enough data
//! to publish and whether anything changed since the last synchronization.

use chrono::{DateTime, TimeZone, Utc};

use crate::constants::YEAR_ZERO;
use crate::records::{FragmentKind, Record};

/// Fragments a record needs before it is considered complete.
const REQUIRED: [FragmentKind; 3] = [
    FragmentKind::BibData,
    FragmentKind::OrcidClaims,
    FragmentKind::NonbibData,
];

/// Fragments whose timestamps are compared against `processed`.
///
/// `fulltext` and `metrics` are excluded from both tests.
const FRESHNESS: [FragmentKind; 4] = [
    FragmentKind::Augments,
    FragmentKind::BibData,
    FragmentKind::NonbibData,
    FragmentKind::OrcidClaims,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Required fragments are missing. Skipped, not an error.
    NotReady { missing: Vec<FragmentKind> },
    /// Complete, but nothing relevant changed since `processed`.
    StaleUnchanged,
    Publishable,
}

/// `processed` value assumed for records never synchronized.
pub fn year_zero() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(YEAR_ZERO, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn classify(record: &Record, force: bool) -> Readiness {
    let missing: Vec<FragmentKind> = REQUIRED
        .into_iter()
        .filter(|kind| record.fragment_updated(*kind).is_none())
        .collect();

    let bib_present = record.bib_data_updated.is_some();
    let complete = missing.is_empty() || (force && bib_present);
    if !complete {
        return Readiness::NotReady { missing };
    }

    if !force {
        let processed = record.processed.unwrap_or_else(year_zero);
        let stale = FRESHNESS
            .into_iter()
            .filter_map(|kind| record.fragment_updated(kind))
            .all(|updated| updated < processed);
        if stale {
            return Readiness::StaleUnchanged;
        }
    }

    Readiness::Publishable
}
