//! Search index client.
//!
//! Documents are posted as a JSON array to every update URL. When a batch is
//! rejected the client retries the documents one by one, so one bad document
//! only fails itself.

use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, error, info, warn};
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::error::{DownstreamError, Result};
use crate::http::{build_client, check_response, headers, HttpSettings};
use recsync_core::publish::{SearchIndexClient, WriteOutcome};
use recsync_core::tasks::PublishItem;

#[derive(Debug, Clone)]
pub struct SolrClient {
    client: reqwest::Client,
    update_urls: Vec<String>,
}

impl SolrClient {
    pub fn new(update_urls: Vec<String>, settings: &HttpSettings) -> Result<Self> {
        if update_urls.is_empty() {
            return Err(DownstreamError::invalid_request(
                "at least one search index update URL is required",
            ));
        }
        Ok(Self {
            client: build_client(settings)?,
            update_urls,
        })
    }

    fn with_commit(url: &str, commit: bool) -> String {
        if !commit {
            return url.to_string();
        }
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{}{}commit=true", url, separator)
    }

    async fn post(&self, url: &str, body: &Value) -> Result<()> {
        let response = self
            .client
            .post(url)
            .headers(headers(None)?)
            .json(body)
            .send()
            .await?;
        check_response(response).await
    }

    /// Writes `items` to one URL. Returns the keys that were written.
    async fn write_to(&self, url: &str, items: &[PublishItem], commit: bool) -> HashSet<String> {
        let url = Self::with_commit(url, commit);
        let docs: Vec<&Value> = items.iter().map(|i| &i.payload).collect();

        match self.post(&url, &json!(docs)).await {
            Ok(()) => {
                debug!("Indexed {} documents at {}", items.len(), url);
                return items.iter().map(|i| i.bibcode.clone()).collect();
            }
            Err(e) => warn!(
                "Batch of {} documents rejected by {}, retrying one by one: {}",
                items.len(),
                url,
                e
            ),
        }

        let mut written = HashSet::new();
        for item in items {
            match self.post(&url, &json!([&item.payload])).await {
                Ok(()) => {
                    written.insert(item.bibcode.clone());
                }
                Err(e) => error!("Failed to index {} at {}: {}", item.bibcode, url, e),
            }
        }
        written
    }

    fn delete_query(keys: &[String]) -> Value {
        let terms: Vec<String> = keys
            .iter()
            .map(|k| format!("\"{}\"", k.replace('\\', "\\\\").replace('"', "\\\"")))
            .collect();
        json!({ "delete": { "query": format!("bibcode:({})", terms.join(" OR ")) } })
    }

    async fn delete_at(&self, url: &str, keys: &[String]) -> HashSet<String> {
        let url = Self::with_commit(url, true);
        if self.post(&url, &Self::delete_query(keys)).await.is_ok() {
            return keys.iter().cloned().collect();
        }

        let mut deleted = HashSet::new();
        for key in keys {
            match self
                .post(&url, &Self::delete_query(std::slice::from_ref(key)))
                .await
            {
                Ok(()) => {
                    deleted.insert(key.clone());
                }
                Err(e) => error!("Failed to delete {} at {}: {}", key, url, e),
            }
        }
        deleted
    }
}

/// An item counts as written only when every URL accepted it.
fn combine(keys: impl Iterator<Item = String>, per_url: &[HashSet<String>]) -> WriteOutcome {
    let mut outcome = WriteOutcome::default();
    for key in keys {
        if per_url.iter().all(|written| written.contains(&key)) {
            outcome.succeeded.push(key);
        } else {
            outcome.failed.push(key);
        }
    }
    outcome
}

#[async_trait]
impl SearchIndexClient for SolrClient {
    async fn upsert_documents(
        &self,
        items: &[PublishItem],
        targets: Option<&[String]>,
        commit: bool,
    ) -> recsync_core::Result<WriteOutcome> {
        if items.is_empty() {
            return Ok(WriteOutcome::default());
        }
        let urls = match targets {
            Some(urls) if !urls.is_empty() => urls,
            _ => self.update_urls.as_slice(),
        };

        let per_url =
            join_all(urls.iter().map(|url| self.write_to(url, items, commit))).await;
        let outcome = combine(items.iter().map(|i| i.bibcode.clone()), &per_url);
        info!(
            "Search index accepted {} of {} documents across {} URLs",
            outcome.succeeded.len(),
            items.len(),
            urls.len()
        );
        Ok(outcome)
    }

    async fn delete_by_keys(&self, keys: &[String]) -> recsync_core::Result<WriteOutcome> {
        if keys.is_empty() {
            return Ok(WriteOutcome::default());
        }
        let per_url = join_all(self.update_urls.iter().map(|url| self.delete_at(url, keys))).await;
        Ok(combine(keys.iter().cloned(), &per_url))
    }
}
