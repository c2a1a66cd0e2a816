use log::{debug, error};
use std::sync::Arc;

use super::deletion_model::{DeletionReport, StepOutcome};
use crate::publish::{MetricsStoreTrait, SearchIndexClient};
use crate::records::RecordRepositoryTrait;

/// Removes a record from the record store, the search index and the metrics
/// store. The three steps are independent: each is attempted whatever the
/// others did, and failures end up in the report instead of an error.
#[derive(Clone)]
pub struct DeletionService {
    records: Arc<dyn RecordRepositoryTrait>,
    search_index: Arc<dyn SearchIndexClient>,
    metrics_store: Option<Arc<dyn MetricsStoreTrait>>,
}

impl DeletionService {
    pub fn new(
        records: Arc<dyn RecordRepositoryTrait>,
        search_index: Arc<dyn SearchIndexClient>,
        metrics_store: Option<Arc<dyn MetricsStoreTrait>>,
    ) -> Self {
        Self {
            records,
            search_index,
            metrics_store,
        }
    }

    pub async fn delete_record(&self, bibcode: &str) -> DeletionReport {
        debug!("To delete: {}", bibcode);

        let record_store = match self.records.delete_record(bibcode).await {
            Ok(true) => StepOutcome::Deleted,
            Ok(false) => StepOutcome::NotFound,
            Err(e) => {
                error!("Failed deleting record {} from storage: {}", bibcode, e);
                StepOutcome::Failed(e.to_string())
            }
        };

        let keys = [bibcode.to_string()];
        let search_index = match self.search_index.delete_by_keys(&keys).await {
            Ok(outcome) if outcome.succeeded.iter().any(|k| k == bibcode) => {
                debug!("Deleted search-index document: {}", bibcode);
                StepOutcome::Deleted
            }
            Ok(outcome) if !outcome.failed.is_empty() => {
                error!("Failed deleting documents from search index: {:?}", outcome.failed);
                StepOutcome::Failed("search index reported failure".to_string())
            }
            Ok(_) => StepOutcome::NotFound,
            Err(e) => {
                error!("Failed deleting {} from search index: {}", bibcode, e);
                StepOutcome::Failed(e.to_string())
            }
        };

        let metrics_store = match &self.metrics_store {
            None => StepOutcome::Skipped,
            Some(store) => match store.delete_metrics(bibcode).await {
                Ok(true) => {
                    debug!("Deleted metrics record: {}", bibcode);
                    StepOutcome::Deleted
                }
                Ok(false) => {
                    debug!("No metrics record to delete for {}", bibcode);
                    StepOutcome::NotFound
                }
                Err(e) => {
                    error!("Failed deleting metrics record {}: {}", bibcode, e);
                    StepOutcome::Failed(e.to_string())
                }
            },
        };

        DeletionReport {
            bibcode: bibcode.to_string(),
            record_store,
            search_index,
            metrics_store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::InMemoryTarget;
    use crate::records::{InMemoryRecordRepository, Record};
    use serde_json::json;

    fn setup() -> (InMemoryRecordRepository, InMemoryTarget, InMemoryTarget, DeletionService) {
        let records = InMemoryRecordRepository::new();
        let index = InMemoryTarget::new();
        let metrics = InMemoryTarget::new();
        records.insert(Record::new("K"));
        index.insert("K", json!({"bibcode": "K"}));
        metrics.insert("K", json!({"bibcode": "K"}));
        let service = DeletionService::new(
            Arc::new(records.clone()),
            Arc::new(index.clone()),
            Some(Arc::new(metrics.clone())),
        );
        (records, index, metrics, service)
    }

    #[tokio::test]
    async fn test_deletes_from_all_three() {
        let (records, index, metrics, service) = setup();
        let report = service.delete_record("K").await;

        assert_eq!(report.record_store, StepOutcome::Deleted);
        assert_eq!(report.search_index, StepOutcome::Deleted);
        assert_eq!(report.metrics_store, StepOutcome::Deleted);
        assert!(records.is_empty() && index.is_empty() && metrics.is_empty());
    }

    #[tokio::test]
    async fn test_search_index_failure_does_not_stop_metrics_delete() {
        let (records, index, metrics, service) = setup();
        index.set_fail_deletes(true);

        let report = service.delete_record("K").await;

        assert!(report.search_index.is_failed());
        assert!(report.has_failures());
        assert_eq!(report.record_store, StepOutcome::Deleted);
        assert_eq!(report.metrics_store, StepOutcome::Deleted);
        assert!(records.is_empty());
        assert!(metrics.is_empty());
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_search_index_reported_failure() {
        let (_records, index, _metrics, service) = setup();
        index.reject("K");
        let report = service.delete_record("K").await;
        assert!(report.search_index.is_failed());
        assert_eq!(report.metrics_store, StepOutcome::Deleted);
    }

    #[tokio::test]
    async fn test_record_store_failure_still_attempts_downstream() {
        let (records, index, metrics, service) = setup();
        records.set_fail_on_delete(true);

        let report = service.delete_record("K").await;

        assert!(report.record_store.is_failed());
        assert_eq!(report.search_index, StepOutcome::Deleted);
        assert_eq!(report.metrics_store, StepOutcome::Deleted);
        assert!(index.is_empty() && metrics.is_empty());
    }

    #[tokio::test]
    async fn test_missing_everywhere_and_no_metrics_store() {
        let records = InMemoryRecordRepository::new();
        let service = DeletionService::new(
            Arc::new(records),
            Arc::new(InMemoryTarget::new()),
            None,
        );
        let report = service.delete_record("NOPE").await;
        assert_eq!(report.record_store, StepOutcome::NotFound);
        assert_eq!(report.metrics_store, StepOutcome::Skipped);
        assert!(!report.has_failures());
    }
}
