//! Tests for PublishService checksum commits.

#[cfg(test)]
mod tests {
    use crate::sync::fingerprint as fp;
    use crate::publish::{InMemoryTarget, PublishService};
    use crate::records::{FragmentKind, InMemoryRecordRepository, RecordRepositoryTrait, Target};
    use crate::tasks::{PublishItem, PublishOptions};
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        records: InMemoryRecordRepository,
        index: InMemoryTarget,
        metrics: InMemoryTarget,
        service: PublishService,
    }

    async fn fixture(keys: &[&str]) -> Fixture {
        let records = InMemoryRecordRepository::new();
        for key in keys {
            records
                .upsert_fragment(key, FragmentKind::BibData, Some(json!({"title": [key]})))
                .await
                .unwrap();
        }
        let index = InMemoryTarget::new();
        let metrics = InMemoryTarget::new();
        let service = PublishService::new(
            Arc::new(records.clone()),
            Arc::new(index.clone()),
            Some(Arc::new(metrics.clone())),
            None,
        );
        Fixture {
            records,
            index,
            metrics,
            service,
        }
    }

    fn item(key: &str) -> PublishItem {
        let payload = json!({"bibcode": key});
        PublishItem {
            bibcode: key.to_string(),
            fingerprint: fp(&payload),
            payload,
            observed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_commits_checksum_for_every_written_item() {
        let f = fixture(&["A", "B"]).await;
        let items = vec![item("A"), item("B")];

        let report = f
            .service
            .publish(Target::SearchIndex, &items, &PublishOptions::default())
            .await
            .unwrap();

        assert_eq!(report.written, 2);
        assert_eq!(report.checksums_committed, 2);
        assert_eq!(f.index.len(), 2);
        let a = f.records.snapshot("A").unwrap();
        assert_eq!(a.solr_checksum.as_deref(), Some(items[0].fingerprint.as_str()));
        assert_eq!(a.processed, Some(items[0].observed_at));
    }

    #[tokio::test]
    async fn test_processed_is_the_read_time_not_the_commit_time() {
        let f = fixture(&["A"]).await;
        let mut read = item("A");
        read.observed_at = Utc::now() - chrono::Duration::minutes(5);

        f.service
            .publish(Target::Metrics, &[read.clone()], &PublishOptions::default())
            .await
            .unwrap();

        let a = f.records.snapshot("A").unwrap();
        assert_eq!(a.processed, Some(read.observed_at));
        assert!(a.processed < a.bib_data_updated);
    }

    #[tokio::test]
    async fn test_partial_success_commits_only_succeeded() {
        let f = fixture(&["A", "B"]).await;
        f.metrics.reject("B");
        let items = vec![item("A"), item("B")];

        let report = f
            .service
            .publish(Target::Metrics, &items, &PublishOptions::default())
            .await
            .unwrap();

        assert_eq!(report.failed, vec!["B".to_string()]);
        assert!(f.records.snapshot("A").unwrap().metrics_checksum.is_some());
        let b = f.records.snapshot("B").unwrap();
        assert!(b.metrics_checksum.is_none());
        assert!(b.processed.is_none());
    }

    #[tokio::test]
    async fn test_failed_batch_commits_nothing_and_completes() {
        let f = fixture(&["A"]).await;
        f.index.set_fail_batches(true);

        let report = f
            .service
            .publish(Target::SearchIndex, &[item("A")], &PublishOptions::default())
            .await
            .unwrap();

        assert_eq!(report.written, 0);
        assert_eq!(report.failed, vec!["A".to_string()]);
        assert!(f.records.snapshot("A").unwrap().solr_checksum.is_none());
    }

    #[tokio::test]
    async fn test_update_processed_false_leaves_processed_alone() {
        let f = fixture(&["A"]).await;
        let options = PublishOptions {
            update_processed: false,
            commit: true,
            ..Default::default()
        };

        f.service
            .publish(Target::SearchIndex, &[item("A")], &options)
            .await
            .unwrap();

        let a = f.records.snapshot("A").unwrap();
        assert!(a.solr_checksum.is_some());
        assert!(a.processed.is_none());
        assert_eq!(f.index.commits(), 1);
    }

    #[tokio::test]
    async fn test_unconfigured_links_fail_every_item() {
        let f = fixture(&["A"]).await;
        let report = f
            .service
            .publish(Target::Links, &[item("A")], &PublishOptions::default())
            .await
            .unwrap();
        assert_eq!(report.written, 0);
        assert!(f.records.snapshot("A").unwrap().datalinks_checksum.is_none());
    }
}
