use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;

use super::fingerprinting::{is_empty_payload, should_publish};
use super::readiness::{classify, Readiness};
use super::sync_model::{SyncOptions, SyncReport};
use crate::constants::BIBCODE_FIELD;
use crate::errors::Result;
use crate::payloads::{build_links_payload, ensure_self_identifier, DocumentBuilder};
use crate::records::{Record, RecordFields, RecordRepositoryTrait, Target};
use crate::tasks::{PublishItem, Task, TaskSink};

/// Synchronization dispatcher.
pub struct SyncService {
    records: Arc<dyn RecordRepositoryTrait>,
    tasks: Arc<dyn TaskSink>,
    documents: Arc<dyn DocumentBuilder>,
    links_enabled: bool,
}

/// A loaded record and the time it was read.
struct SeenRecord<'a> {
    record: &'a Record,
    observed_at: DateTime<Utc>,
}

impl SeenRecord<'_> {
    fn item(&self, payload: serde_json::Value, fingerprint: String) -> PublishItem {
        PublishItem {
            bibcode: self.record.bibcode.clone(),
            payload,
            fingerprint,
            observed_at: self.observed_at,
        }
    }
}

#[derive(Default)]
struct Batches {
    search_index: Vec<PublishItem>,
    metrics: Vec<PublishItem>,
    links: Vec<PublishItem>,
}

impl SyncService {
    pub fn new(
        records: Arc<dyn RecordRepositoryTrait>,
        tasks: Arc<dyn TaskSink>,
        documents: Arc<dyn DocumentBuilder>,
        links_enabled: bool,
    ) -> Self {
        Self {
            records,
            tasks,
            documents,
            links_enabled,
        }
    }

    /// Publishes the changed payloads of `keys`.
    ///
    /// Each key is examined once, in first-seen order. Missing and incomplete
    /// records are skipped. Changed payloads are accumulated per target and
    /// handed over as one publish task per non-empty target.
    pub fn synchronize(&self, keys: &[String], options: &SyncOptions) -> Result<SyncReport> {
        options.validate()?;

        let fields = RecordFields::for_targets(
            options.update_index,
            options.update_metrics,
            options.update_links,
        );
        let mut report = SyncReport {
            requested: keys.len(),
            ..Default::default()
        };
        let mut batches = Batches::default();
        let mut seen: HashSet<&str> = HashSet::with_capacity(keys.len());

        for key in keys {
            if !seen.insert(key.as_str()) {
                continue;
            }
            report.processed += 1;

            // Taken before the read, so a fragment written after it always
            // stamps later than the `processed` time committed for this pass.
            let observed_at = Utc::now();
            let record = match self.records.get_record(key, &fields) {
                Ok(Some(record)) => record,
                Ok(None) => {
                    error!("The bibcode {} doesn't exist!", key);
                    report.missing += 1;
                    continue;
                }
                Err(e) => {
                    error!("Failed to load {}: {}", key, e);
                    report.failed += 1;
                    continue;
                }
            };

            match classify(&record, options.force) {
                Readiness::NotReady { missing } => {
                    report.not_ready += 1;
                    if options.force {
                        warn!(
                            "{} is missing bib data, even with force this cannot proceed",
                            key
                        );
                    } else {
                        debug!(
                            "{} not ready for indexing yet, missing {:?} ({})",
                            key,
                            missing,
                            record.timestamps_summary()
                        );
                    }
                    continue;
                }
                Readiness::StaleUnchanged => {
                    report.stale += 1;
                    debug!(
                        "{} has not changed since it was last processed, skipping",
                        key
                    );
                    continue;
                }
                Readiness::Publishable => {}
            }

            let seen_record = SeenRecord {
                record: &record,
                observed_at,
            };
            if options.update_index {
                self.accumulate_document(&seen_record, options, &mut batches);
            }
            if options.update_metrics {
                self.accumulate_metrics(&seen_record, options, &mut batches);
            }
            if options.update_links && self.links_enabled {
                self.accumulate_links(&seen_record, options, &mut batches);
            }
        }

        report.accumulated.search_index = batches.search_index.len();
        report.accumulated.metrics = batches.metrics.len();
        report.accumulated.links = batches.links.len();

        let publish_options = options.publish_options();
        for (target, items) in [
            (Target::SearchIndex, batches.search_index),
            (Target::Metrics, batches.metrics),
            (Target::Links, batches.links),
        ] {
            if items.is_empty() {
                continue;
            }
            self.tasks.submit(Task::Publish {
                target,
                items,
                options: publish_options.clone(),
            })?;
            report.tasks_submitted += 1;
        }

        info!(
            "Synchronized {} key(s): {} missing, {} not ready, {} unchanged, {} failed, {} task(s) submitted",
            report.processed,
            report.missing,
            report.not_ready,
            report.stale,
            report.failed,
            report.tasks_submitted
        );
        Ok(report)
    }

    /// Index-only synchronization that republishes unconditionally.
    pub fn rebuild(&self, keys: &[String], index_targets: Option<Vec<String>>) -> Result<SyncReport> {
        self.synchronize(keys, &SyncOptions::rebuild(index_targets))
    }

    fn accumulate_document(
        &self,
        seen: &SeenRecord<'_>,
        options: &SyncOptions,
        batches: &mut Batches,
    ) {
        let record = seen.record;
        let mut doc = self.documents.build(record);
        ensure_self_identifier(&mut doc, &record.bibcode);

        let (publish, digest) =
            should_publish(Target::SearchIndex, record, &doc, options.ignore_fingerprints);
        if publish {
            batches.search_index.push(seen.item(doc, digest));
        } else {
            debug!(
                "Checksum identical, skipping search-index update for: {}",
                record.bibcode
            );
        }
    }

    fn accumulate_metrics(
        &self,
        seen: &SeenRecord<'_>,
        options: &SyncOptions,
        batches: &mut Batches,
    ) {
        let record = seen.record;
        let metrics = match &record.metrics {
            Some(m) if !is_empty_payload(Some(m)) => m,
            _ => {
                debug!("No metrics data available for: {}", record.bibcode);
                return;
            }
        };

        let mut payload = metrics.clone();
        if let Some(map) = payload.as_object_mut() {
            map.insert(
                BIBCODE_FIELD.to_string(),
                serde_json::Value::String(record.bibcode.clone()),
            );
        }

        let (publish, digest) =
            should_publish(Target::Metrics, record, &payload, options.ignore_fingerprints);
        if publish {
            batches.metrics.push(seen.item(payload, digest));
        } else {
            debug!(
                "Checksum identical, skipping metrics update for: {}",
                record.bibcode
            );
        }
    }

    fn accumulate_links(
        &self,
        seen: &SeenRecord<'_>,
        options: &SyncOptions,
        batches: &mut Batches,
    ) {
        let record = seen.record;
        let Some(payload) = build_links_payload(record) else {
            return;
        };
        let (publish, digest) =
            should_publish(Target::Links, record, &payload, options.ignore_fingerprints);
        if publish {
            batches.links.push(seen.item(payload, digest));
        }
    }
}
