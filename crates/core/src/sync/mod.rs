//! Selective record synchronization.
//!
//! The readiness gate and the fingerprint engine decide, per record and per
//! target, whether a payload must be published. The dispatcher batches the
//! changed payloads into one publish task per target.

mod fingerprinting;
mod readiness;
mod sync_model;
mod sync_service;

#[cfg(test)]
mod tests;

pub use fingerprinting::{canonical_json, fingerprint, is_empty_payload, should_publish};
pub use readiness::{classify, year_zero, Readiness};
pub use sync_model::{SyncOptions, SyncReport, TargetCounts};
pub use sync_service::SyncService;
