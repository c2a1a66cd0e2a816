//! Dispatcher scenarios, run against the in-memory store and targets.

use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{SyncOptions, SyncService};
use crate::errors::Error;
use crate::payloads::{DocumentBuilder, SearchDocumentBuilder};
use crate::publish::{InMemoryTarget, PublishService};
use crate::records::{FragmentKind, InMemoryRecordRepository, Record, RecordRepositoryTrait, Target};
use crate::tasks::{MockTaskSink, PublishItem, Task};

struct Harness {
    records: InMemoryRecordRepository,
    tasks: MockTaskSink,
    index: InMemoryTarget,
    metrics: InMemoryTarget,
    links: InMemoryTarget,
    sync: SyncService,
    publish: PublishService,
}

fn harness_with(documents: Arc<dyn DocumentBuilder>, links_enabled: bool) -> Harness {
    let records = InMemoryRecordRepository::new();
    let tasks = MockTaskSink::new();
    let index = InMemoryTarget::new();
    let metrics = InMemoryTarget::new();
    let links = InMemoryTarget::new();
    let sync = SyncService::new(
        Arc::new(records.clone()),
        Arc::new(tasks.clone()),
        documents,
        links_enabled,
    );
    let publish = PublishService::new(
        Arc::new(records.clone()),
        Arc::new(index.clone()),
        Some(Arc::new(metrics.clone())),
        Some(Arc::new(links.clone())),
    );
    Harness {
        records,
        tasks,
        index,
        metrics,
        links,
        sync,
        publish,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(SearchDocumentBuilder::default()), true)
}

impl Harness {
    /// Runs every submitted publish task, like the queue workers would.
    async fn drain(&self) {
        for task in self.tasks.drain() {
            if let Task::Publish {
                target,
                items,
                options,
            } = task
            {
                self.publish.publish(target, &items, &options).await.unwrap();
            }
        }
    }

    fn published(&self, target: Target) -> Vec<PublishItem> {
        self.tasks
            .tasks()
            .into_iter()
            .filter_map(|task| match task {
                Task::Publish { target: t, items, .. } if t == target => Some(items),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

fn at(minutes: i64) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn complete(key: &str) -> Record {
    let mut r = Record::new(key);
    r.bib_data = Some(json!({"title": [format!("Title of {}", key)]}));
    r.bib_data_updated = Some(at(1));
    r.orcid_claims = Some(json!({"verified": []}));
    r.orcid_claims_updated = Some(at(2));
    r.nonbib_data = Some(json!({
        "citation_count": 4,
        "data_links_rows": [{"link_type": "ESOURCE", "url": ["http://x"]}]
    }));
    r.nonbib_data_updated = Some(at(3));
    r.metrics = Some(json!({"citation_num": 4}));
    r.metrics_updated = Some(at(3));
    r
}

fn keys(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

#[test]
fn test_all_targets_disabled_is_config_error() {
    let h = harness();
    let options = SyncOptions {
        update_index: false,
        update_metrics: false,
        update_links: false,
        ..Default::default()
    };
    let err = h.sync.synchronize(&keys(&["A"]), &options).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(!err.is_retryable());
    assert!(h.tasks.is_empty());
}

#[test]
fn test_complete_unprocessed_record_publishes_with_self_identifier() {
    let h = harness();
    h.records.insert(complete("2024ApJ...9A"));

    let report = h
        .sync
        .synchronize(&keys(&["2024ApJ...9A"]), &SyncOptions::default())
        .unwrap();

    assert_eq!(report.tasks_submitted, 3);
    let docs = h.published(Target::SearchIndex);
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].payload["identifier"], json!(["2024ApJ...9A"]));
    assert_eq!(docs[0].fingerprint, super::fingerprint(&docs[0].payload));

    let metrics = h.published(Target::Metrics);
    assert_eq!(metrics[0].payload["bibcode"], json!("2024ApJ...9A"));
    assert_eq!(metrics[0].payload["citation_num"], json!(4));
    assert_eq!(h.published(Target::Links).len(), 1);
}

#[tokio::test]
async fn test_second_run_on_unchanged_records_publishes_nothing() {
    let h = harness();
    h.records.insert(complete("A"));
    h.records.insert(complete("B"));

    h.sync
        .synchronize(&keys(&["A", "B"]), &SyncOptions::default())
        .unwrap();
    h.drain().await;
    assert_eq!(h.index.len(), 2);
    assert_eq!(h.metrics.len(), 2);
    assert_eq!(h.links.len(), 2);

    let report = h
        .sync
        .synchronize(&keys(&["A", "B"]), &SyncOptions::default())
        .unwrap();
    assert_eq!(report.stale, 2);
    assert_eq!(report.tasks_submitted, 0);
    assert!(h.tasks.is_empty());
}

#[tokio::test]
async fn test_fingerprints_suppress_republish_when_only_timestamps_move() {
    let h = harness();
    h.records.insert(complete("A"));
    let options = SyncOptions {
        update_processed: false,
        ..Default::default()
    };

    h.sync.synchronize(&keys(&["A"]), &options).unwrap();
    h.drain().await;

    let report = h.sync.synchronize(&keys(&["A"]), &options).unwrap();
    assert_eq!(report.stale, 0);
    assert_eq!(report.accumulated.search_index, 0);
    assert_eq!(report.tasks_submitted, 0);
}

#[test]
fn test_bib_only_record_needs_force() {
    let h = harness();
    let mut r = Record::new("BIBONLY");
    r.bib_data = Some(json!({"title": ["t"]}));
    r.bib_data_updated = Some(at(1));
    h.records.insert(r);

    let report = h
        .sync
        .synchronize(&keys(&["BIBONLY"]), &SyncOptions::default())
        .unwrap();
    assert_eq!(report.not_ready, 1);
    assert!(h.tasks.is_empty());

    let report = h.sync.rebuild(&keys(&["BIBONLY"]), None).unwrap();
    assert_eq!(report.accumulated.search_index, 1);
    assert_eq!(report.tasks_submitted, 1);
    assert_eq!(h.published(Target::SearchIndex).len(), 1);
}

#[tokio::test]
async fn test_rebuild_ignores_fingerprints_and_processed() {
    let h = harness();
    h.records.insert(complete("A"));
    h.sync.synchronize(&keys(&["A"]), &SyncOptions::default()).unwrap();
    h.drain().await;
    let processed = h.records.snapshot("A").unwrap().processed;

    let report = h
        .sync
        .rebuild(&keys(&["A"]), Some(vec!["http://solr/b".into()]))
        .unwrap();
    assert_eq!(report.accumulated.search_index, 1);
    assert_eq!(report.accumulated.metrics, 0);
    assert_eq!(report.accumulated.links, 0);

    match &h.tasks.tasks()[0] {
        Task::Publish { options, .. } => {
            assert!(!options.commit);
            assert!(!options.update_processed);
            assert_eq!(options.index_targets, Some(vec!["http://solr/b".to_string()]));
        }
        other => panic!("unexpected task {:?}", other),
    }

    h.drain().await;
    assert_eq!(h.records.snapshot("A").unwrap().processed, processed);
}

#[test]
fn test_record_without_bib_data_is_never_published() {
    let h = harness();
    let mut r = complete("NOBIB");
    r.bib_data = None;
    r.bib_data_updated = None;
    h.records.insert(r);

    for options in [SyncOptions::default(), SyncOptions::rebuild(None)] {
        let report = h.sync.synchronize(&keys(&["NOBIB"]), &options).unwrap();
        assert_eq!(report.not_ready, 1);
    }
    assert!(h.tasks.is_empty());
}

#[test]
fn test_empty_metrics_never_published_even_ignoring_fingerprints() {
    let h = harness();
    let mut r = complete("A");
    r.metrics = Some(json!({}));
    h.records.insert(r);

    let options = SyncOptions {
        ignore_fingerprints: true,
        ..Default::default()
    };
    let report = h.sync.synchronize(&keys(&["A"]), &options).unwrap();
    assert_eq!(report.accumulated.metrics, 0);
    assert_eq!(report.accumulated.search_index, 1);
    assert!(h.published(Target::Metrics).is_empty());
}

#[test]
fn test_duplicate_and_missing_keys() {
    let h = harness();
    h.records.insert(complete("A"));

    let report = h
        .sync
        .synchronize(&keys(&["A", "GONE", "A"]), &SyncOptions::default())
        .unwrap();

    assert_eq!(report.requested, 3);
    assert_eq!(report.processed, 2);
    assert_eq!(report.missing, 1);
    assert_eq!(h.published(Target::SearchIndex).len(), 1);
}

#[test]
fn test_links_skipped_when_resolver_not_configured() {
    let h = harness_with(Arc::new(SearchDocumentBuilder::default()), false);
    h.records.insert(complete("A"));

    let report = h.sync.synchronize(&keys(&["A"]), &SyncOptions::default()).unwrap();
    assert_eq!(report.accumulated.links, 0);
    assert_eq!(report.tasks_submitted, 2);
}

#[test]
fn test_record_without_link_rows_has_no_links_payload() {
    let h = harness();
    let mut r = complete("A");
    r.nonbib_data = Some(json!({"citation_count": 4}));
    h.records.insert(r);

    let report = h.sync.synchronize(&keys(&["A"]), &SyncOptions::default()).unwrap();
    assert_eq!(report.accumulated.links, 0);
}

struct CountingBuilder(AtomicUsize);

impl DocumentBuilder for CountingBuilder {
    fn build(&self, record: &Record) -> Value {
        self.0.fetch_add(1, Ordering::SeqCst);
        json!({"bibcode": record.bibcode})
    }
}

#[test]
fn test_metrics_only_does_not_build_documents_or_load_metadata() {
    let builder = Arc::new(CountingBuilder(AtomicUsize::new(0)));
    let h = harness_with(builder.clone(), true);
    h.records.insert(complete("A"));

    let options = SyncOptions {
        update_index: false,
        update_links: false,
        ..Default::default()
    };
    let report = h.sync.synchronize(&keys(&["A"]), &options).unwrap();

    assert_eq!(builder.0.load(Ordering::SeqCst), 0);
    assert_eq!(report.accumulated.metrics, 1);
    let metrics = h.published(Target::Metrics);
    assert!(metrics[0].payload.get("title").is_none());
}

#[test]
fn test_fragment_newer_than_processed_republishes() {
    // bib_data at T1 < orcid at T2 < nonbib at T3, never processed
    let h = harness();
    let mut r = complete("K");
    r.processed = None;
    h.records.insert(r);
    let report = h.sync.synchronize(&keys(&["K"]), &SyncOptions::default()).unwrap();
    assert_eq!(report.accumulated.search_index, 1);

    let mut r = complete("P");
    r.processed = Some(at(10));
    r.augments_updated = Some(at(11));
    r.augments = Some(json!({"aff": ["Somewhere"]}));
    h.records.insert(r);
    let report = h.sync.synchronize(&keys(&["P"]), &SyncOptions::default()).unwrap();
    assert_eq!(report.stale, 0);
    assert_eq!(report.accumulated.search_index, 1);
}

#[tokio::test]
async fn test_update_landing_between_sync_and_publish_is_not_lost() {
    let h = harness();
    h.records.insert(complete("R"));

    h.sync.synchronize(&keys(&["R"]), &SyncOptions::default()).unwrap();
    // A new nonbib fragment arrives while the publish task is still queued.
    h.records
        .upsert_fragment(
            "R",
            FragmentKind::NonbibData,
            Some(json!({"citation_count": 99})),
        )
        .await
        .unwrap();
    h.drain().await;

    let stored = h.records.snapshot("R").unwrap();
    assert!(stored.processed < stored.nonbib_data_updated);

    let report = h.sync.synchronize(&keys(&["R"]), &SyncOptions::default()).unwrap();
    assert_eq!(report.stale, 0);
    assert_eq!(report.accumulated.search_index, 1);
    h.drain().await;
    assert_eq!(h.index.get("R").unwrap()["citation_count"], json!(99));
}

#[tokio::test]
async fn test_unreadable_key_does_not_abort_the_batch() {
    let h = harness();
    h.records.insert(complete("A"));
    h.records.insert(complete("BROKEN"));
    h.records.insert(complete("C"));
    h.records.set_fail_on_get("BROKEN");

    let report = h
        .sync
        .synchronize(&keys(&["A", "BROKEN", "C"]), &SyncOptions::default())
        .unwrap();
    assert_eq!(report.processed, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.missing, 0);
    assert_eq!(report.accumulated.search_index, 2);
    assert_eq!(report.accumulated.metrics, 2);

    h.drain().await;
    assert!(h.index.get("A").is_some());
    assert!(h.index.get("C").is_some());
    assert!(h.index.get("BROKEN").is_none());
}
