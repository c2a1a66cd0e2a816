use async_trait::async_trait;

use super::publish_model::WriteOutcome;
use crate::errors::Result;
use crate::tasks::PublishItem;

/// Client for the search index.
#[async_trait]
pub trait SearchIndexClient: Send + Sync {
    /// Writes documents. `targets` overrides the configured update URLs.
    ///
    /// An `Err` means nothing is known to have been written.
    async fn upsert_documents(
        &self,
        items: &[PublishItem],
        targets: Option<&[String]>,
        commit: bool,
    ) -> Result<WriteOutcome>;

    /// Deletes documents by key. `succeeded` lists the deleted keys.
    async fn delete_by_keys(&self, keys: &[String]) -> Result<WriteOutcome>;
}

/// Metrics store.
#[async_trait]
pub trait MetricsStoreTrait: Send + Sync {
    async fn upsert_metrics(&self, items: &[PublishItem]) -> Result<WriteOutcome>;

    /// Returns false when there was nothing to delete.
    async fn delete_metrics(&self, bibcode: &str) -> Result<bool>;
}

/// Links resolver service.
#[async_trait]
pub trait LinksResolverClient: Send + Sync {
    async fn update_links(&self, items: &[PublishItem]) -> Result<WriteOutcome>;
}
