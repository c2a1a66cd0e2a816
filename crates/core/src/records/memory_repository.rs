//! In-process record store.
//!
//! Backs tests and single-process tooling. Every operation takes the map lock
//! once, which gives the same per-fragment atomicity as the SQLite store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::records_model::{FragmentKind, Record, RecordFields, Target};
use super::records_traits::RecordRepositoryTrait;
use crate::errors::{DatabaseError, Error, Result};

#[derive(Clone, Default)]
pub struct InMemoryRecordRepository {
    records: Arc<Mutex<BTreeMap<String, Record>>>,
    next_id: Arc<Mutex<i64>>,
    fail_on_delete: Arc<Mutex<bool>>,
    fail_on_get: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record as-is, bypassing the clock.
    pub fn insert(&self, mut record: Record) {
        if record.id.is_none() {
            record.id = Some(self.allocate_id());
        }
        self.lock().insert(record.bibcode.clone(), record);
    }

    /// Full copy of a stored record, for assertions.
    pub fn snapshot(&self, bibcode: &str) -> Option<Record> {
        self.lock().get(bibcode).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Makes `delete_record` fail, to exercise best-effort cleanup.
    pub fn set_fail_on_delete(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_on_delete.lock() {
            *flag = fail;
        }
    }

    /// Makes `get_record` fail for `bibcode`.
    pub fn set_fail_on_get(&self, bibcode: &str) {
        if let Ok(mut keys) = self.fail_on_get.lock() {
            keys.insert(bibcode.to_string());
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Record>> {
        // A poisoned map only means another test thread panicked mid-write;
        // the data itself is still consistent per operation.
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn allocate_id(&self) -> i64 {
        let mut next = self
            .next_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *next += 1;
        *next
    }
}

#[async_trait]
impl RecordRepositoryTrait for InMemoryRecordRepository {
    fn get_record(&self, bibcode: &str, fields: &RecordFields) -> Result<Option<Record>> {
        let fail = self
            .fail_on_get
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(bibcode);
        if fail {
            return Err(Error::Database(DatabaseError::QueryFailed(format!(
                "read of {} rejected by store",
                bibcode
            ))));
        }
        Ok(self.lock().get(bibcode).map(|r| r.project(fields)))
    }

    async fn upsert_fragment(
        &self,
        bibcode: &str,
        kind: FragmentKind,
        payload: Option<Value>,
    ) -> Result<Option<Record>> {
        let now = Utc::now();
        let id = if self.lock().contains_key(bibcode) {
            None
        } else {
            Some(self.allocate_id())
        };

        let mut records = self.lock();
        let record = records.entry(bibcode.to_string()).or_insert_with(|| Record {
            id,
            bibcode: bibcode.to_string(),
            created: Some(now),
            ..Default::default()
        });
        record.set_fragment(kind, payload, now);
        Ok(Some(record.clone()))
    }

    async fn delete_record(&self, bibcode: &str) -> Result<bool> {
        let fail = *self
            .fail_on_delete
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if fail {
            return Err(Error::Database(DatabaseError::QueryFailed(
                "delete rejected by store".to_string(),
            )));
        }
        Ok(self.lock().remove(bibcode).is_some())
    }

    async fn commit_checksum(
        &self,
        bibcode: &str,
        target: Target,
        checksum: &str,
        processed: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let mut records = self.lock();
        match records.get_mut(bibcode) {
            Some(record) => {
                record.set_checksum(target, Some(checksum.to_string()));
                if processed.is_some() {
                    record.processed = processed;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn keys_updated_since(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<(String, DateTime<Utc>)>> {
        let records = self.lock();
        let mut changed: Vec<(DateTime<Utc>, &String)> = records
            .values()
            .filter_map(|r| r.updated.map(|u| (u, &r.bibcode)))
            .filter(|(updated, _)| *updated > since)
            .collect();
        changed.sort();
        Ok(changed
            .into_iter()
            .take(limit)
            .map(|(updated, bibcode)| (bibcode.clone(), updated))
            .collect())
    }
}
