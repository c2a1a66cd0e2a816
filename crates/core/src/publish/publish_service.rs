use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;

use super::publish_model::{PublishReport, WriteOutcome};
use super::publish_traits::{LinksResolverClient, MetricsStoreTrait, SearchIndexClient};
use crate::errors::{Error, Result};
use crate::records::{RecordRepositoryTrait, Target};
use crate::tasks::{PublishItem, PublishOptions};

/// Writes batches to downstream targets and commits the fingerprints of the
/// items that made it.
#[derive(Clone)]
pub struct PublishService {
    records: Arc<dyn RecordRepositoryTrait>,
    search_index: Arc<dyn SearchIndexClient>,
    metrics_store: Option<Arc<dyn MetricsStoreTrait>>,
    links_resolver: Option<Arc<dyn LinksResolverClient>>,
}

impl PublishService {
    pub fn new(
        records: Arc<dyn RecordRepositoryTrait>,
        search_index: Arc<dyn SearchIndexClient>,
        metrics_store: Option<Arc<dyn MetricsStoreTrait>>,
        links_resolver: Option<Arc<dyn LinksResolverClient>>,
    ) -> Self {
        Self {
            records,
            search_index,
            metrics_store,
            links_resolver,
        }
    }

    /// Publishes `items` to `target`.
    ///
    /// A failing batch call is not an error: every item is reported failed and
    /// keeps its previous fingerprint, so the next synchronization retries it.
    /// Errors are returned only when committing a fingerprint fails.
    pub async fn publish(
        &self,
        target: Target,
        items: &[PublishItem],
        options: &PublishOptions,
    ) -> Result<PublishReport> {
        if items.is_empty() {
            return Ok(PublishReport::empty(target));
        }

        debug!(
            "Publishing {} item(s) to {} (priority {})",
            items.len(),
            target,
            options.priority
        );

        let keys = || items.iter().map(|i| i.bibcode.clone());
        let outcome = match self.write(target, items, options).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Batch write of {} item(s) to {} failed: {}", items.len(), target, e);
                WriteOutcome::all_failed(keys())
            }
        };

        if !outcome.failed.is_empty() {
            warn!(
                "{} of {} item(s) failed to publish to {}: {:?}",
                outcome.failed.len(),
                items.len(),
                target,
                outcome.failed
            );
        }

        let succeeded: HashSet<&str> = outcome.succeeded.iter().map(String::as_str).collect();
        let mut committed = 0;
        for item in items.iter().filter(|i| succeeded.contains(i.bibcode.as_str())) {
            let found = self
                .records
                .commit_checksum(
                    &item.bibcode,
                    target,
                    &item.fingerprint,
                    options.update_processed.then_some(item.observed_at),
                )
                .await?;
            if found {
                committed += 1;
            } else {
                warn!(
                    "Record {} vanished before its {} checksum could be stored",
                    item.bibcode, target
                );
            }
        }

        info!(
            "Published {}/{} item(s) to {}",
            outcome.succeeded.len(),
            items.len(),
            target
        );

        Ok(PublishReport {
            target,
            submitted: items.len(),
            written: outcome.succeeded.len(),
            failed: outcome.failed,
            checksums_committed: committed,
        })
    }

    async fn write(
        &self,
        target: Target,
        items: &[PublishItem],
        options: &PublishOptions,
    ) -> Result<WriteOutcome> {
        match target {
            Target::SearchIndex => {
                self.search_index
                    .upsert_documents(items, options.index_targets.as_deref(), options.commit)
                    .await
            }
            Target::Metrics => match &self.metrics_store {
                Some(store) => store.upsert_metrics(items).await,
                None => Err(Error::Config("metrics store is not configured".to_string())),
            },
            Target::Links => match &self.links_resolver {
                Some(client) => client.update_links(items).await,
                None => Err(Error::Config(
                    "links resolver is not configured".to_string(),
                )),
            },
        }
    }
}
