//! In-process downstream targets.
//!
//! Used by tests and by local runs without real downstream services. Each
//! target can be told to reject specific keys or the whole batch.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use super::publish_model::WriteOutcome;
use super::publish_traits::{LinksResolverClient, MetricsStoreTrait, SearchIndexClient};
use crate::errors::{Error, Result};
use crate::tasks::PublishItem;

#[derive(Default)]
struct Inner {
    docs: BTreeMap<String, Value>,
    reject: HashSet<String>,
    fail_batches: bool,
    fail_deletes: bool,
    batches: usize,
    commits: usize,
}

impl Inner {
    fn write(&mut self, items: &[PublishItem]) -> Result<WriteOutcome> {
        if self.fail_batches {
            return Err(Error::Downstream("batch rejected".to_string()));
        }
        self.batches += 1;
        let mut outcome = WriteOutcome::default();
        for item in items {
            if self.reject.contains(&item.bibcode) {
                outcome.failed.push(item.bibcode.clone());
            } else {
                self.docs.insert(item.bibcode.clone(), item.payload.clone());
                outcome.succeeded.push(item.bibcode.clone());
            }
        }
        Ok(outcome)
    }
}

/// Shared state and failure controls of the in-memory targets.
#[derive(Clone, Default)]
pub struct InMemoryTarget {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bibcode: &str) -> Option<Value> {
        self.inner.lock().unwrap().docs.get(bibcode).cloned()
    }

    pub fn insert(&self, bibcode: &str, doc: Value) {
        self.inner
            .lock()
            .unwrap()
            .docs
            .insert(bibcode.to_string(), doc);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of accepted batch calls.
    pub fn batches(&self) -> usize {
        self.inner.lock().unwrap().batches
    }

    /// Number of batch calls that asked for a commit.
    pub fn commits(&self) -> usize {
        self.inner.lock().unwrap().commits
    }

    /// Makes writes of `bibcode` fail individually.
    pub fn reject(&self, bibcode: &str) {
        self.inner
            .lock()
            .unwrap()
            .reject
            .insert(bibcode.to_string());
    }

    /// Makes every batch call fail.
    pub fn set_fail_batches(&self, fail: bool) {
        self.inner.lock().unwrap().fail_batches = fail;
    }

    /// Makes every delete call fail.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_deletes = fail;
    }
}

#[async_trait]
impl SearchIndexClient for InMemoryTarget {
    async fn upsert_documents(
        &self,
        items: &[PublishItem],
        _targets: Option<&[String]>,
        commit: bool,
    ) -> Result<WriteOutcome> {
        let mut inner = self.inner.lock().unwrap();
        let outcome = inner.write(items)?;
        if commit {
            inner.commits += 1;
        }
        Ok(outcome)
    }

    async fn delete_by_keys(&self, keys: &[String]) -> Result<WriteOutcome> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_deletes {
            return Err(Error::Downstream("delete rejected".to_string()));
        }
        let mut outcome = WriteOutcome::default();
        for key in keys {
            if inner.reject.contains(key) {
                outcome.failed.push(key.clone());
            } else {
                inner.docs.remove(key);
                outcome.succeeded.push(key.clone());
            }
        }
        Ok(outcome)
    }
}

#[async_trait]
impl MetricsStoreTrait for InMemoryTarget {
    async fn upsert_metrics(&self, items: &[PublishItem]) -> Result<WriteOutcome> {
        self.inner.lock().unwrap().write(items)
    }

    async fn delete_metrics(&self, bibcode: &str) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_deletes {
            return Err(Error::Downstream("delete rejected".to_string()));
        }
        Ok(inner.docs.remove(bibcode).is_some())
    }
}

#[async_trait]
impl LinksResolverClient for InMemoryTarget {
    async fn update_links(&self, items: &[PublishItem]) -> Result<WriteOutcome> {
        self.inner.lock().unwrap().write(items)
    }
}
