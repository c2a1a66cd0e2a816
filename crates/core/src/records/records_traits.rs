use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::records_model::{FragmentKind, Record, RecordFields, Target};
use crate::errors::Result;

/// Storage interface for canonical records.
///
/// Writes are atomic at single-fragment granularity: an upsert touches only the
/// payload and timestamp of its own fragment, so notifications of different
/// kinds racing on the same key never lose each other's updates.
#[async_trait]
pub trait RecordRepositoryTrait: Send + Sync {
    /// Loads a record, materializing only the payloads selected by `fields`.
    fn get_record(&self, bibcode: &str, fields: &RecordFields) -> Result<Option<Record>>;

    /// Creates the record if needed and replaces one fragment.
    ///
    /// The fragment timestamp is the store's own clock at write time. `None`
    /// clears the payload but still stamps the fragment.
    async fn upsert_fragment(
        &self,
        bibcode: &str,
        kind: FragmentKind,
        payload: Option<Value>,
    ) -> Result<Option<Record>>;

    /// Removes the record. Returns false when it did not exist.
    async fn delete_record(&self, bibcode: &str) -> Result<bool>;

    /// Stores the fingerprint of a confirmed downstream write. When `processed`
    /// is given it becomes the record's processed time; callers pass the time
    /// the published state was read, not the commit time. Returns false when
    /// the record is gone.
    async fn commit_checksum(
        &self,
        bibcode: &str,
        target: Target,
        checksum: &str,
        processed: Option<DateTime<Utc>>,
    ) -> Result<bool>;

    /// Keys of records written after `since` with their `updated` time,
    /// oldest first.
    fn keys_updated_since(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<(String, DateTime<Utc>)>>;
}
