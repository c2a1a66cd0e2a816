//! Pipeline context.
//!
//! Bundles the record store, downstream clients and task sink every service
//! needs. Services are built from it on demand; none of them keeps state of
//! its own between calls.

use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use crate::deletion::DeletionService;
use crate::errors::Result;
use crate::ingest::{AugmentationClient, RecordUpdateService};
use crate::payloads::SearchDocumentBuilder;
use crate::publish::{LinksResolverClient, MetricsStoreTrait, PublishService, SearchIndexClient};
use crate::records::RecordRepositoryTrait;
use crate::sitemap::{SitemapRepositoryTrait, SitemapService};
use crate::sync::SyncService;
use crate::tasks::{Task, TaskSink};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub sitemap_dir: PathBuf,
    /// Add the `has` field to search-index documents.
    pub enable_has: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            sitemap_dir: PathBuf::from("./sitemap"),
            enable_has: true,
        }
    }
}

#[derive(Clone)]
pub struct PipelineContext {
    pub records: Arc<dyn RecordRepositoryTrait>,
    pub sitemaps: Arc<dyn SitemapRepositoryTrait>,
    pub search_index: Arc<dyn SearchIndexClient>,
    pub metrics_store: Option<Arc<dyn MetricsStoreTrait>>,
    pub links_resolver: Option<Arc<dyn LinksResolverClient>>,
    pub augmentation: Option<Arc<dyn AugmentationClient>>,
    pub tasks: Arc<dyn TaskSink>,
    pub settings: PipelineSettings,
}

impl PipelineContext {
    pub fn sync_service(&self) -> SyncService {
        SyncService::new(
            self.records.clone(),
            self.tasks.clone(),
            Arc::new(SearchDocumentBuilder::new(self.settings.enable_has)),
            self.links_resolver.is_some(),
        )
    }

    pub fn publish_service(&self) -> PublishService {
        PublishService::new(
            self.records.clone(),
            self.search_index.clone(),
            self.metrics_store.clone(),
            self.links_resolver.clone(),
        )
    }

    pub fn deletion_service(&self) -> DeletionService {
        DeletionService::new(
            self.records.clone(),
            self.search_index.clone(),
            self.metrics_store.clone(),
        )
    }

    pub fn update_service(&self) -> RecordUpdateService {
        RecordUpdateService::new(
            self.records.clone(),
            self.deletion_service(),
            self.tasks.clone(),
        )
    }

    pub fn sitemap_service(&self) -> SitemapService {
        SitemapService::new(
            self.records.clone(),
            self.sitemaps.clone(),
            self.settings.sitemap_dir.clone(),
        )
    }

    /// Runs one task to completion.
    ///
    /// Per-item failures are reported in logs, not as errors. An `Err` means
    /// the task as a whole could not run.
    pub async fn run_task(&self, task: Task) -> Result<()> {
        match task {
            Task::UpdateRecord { message } => {
                let report = self.update_service().handle_message(&message).await?;
                debug!("Update report: {:?}", report);
            }
            Task::IndexRecords { bibcodes, options } => {
                self.sync_service().synchronize(&bibcodes, &options)?;
            }
            Task::RebuildIndex {
                bibcodes,
                index_targets,
            } => {
                self.sync_service().rebuild(&bibcodes, index_targets)?;
            }
            Task::DeleteRecord { bibcode } => {
                let report = self.deletion_service().delete_record(&bibcode).await;
                if report.has_failures() {
                    warn!("Deletion of {} was incomplete: {:?}", bibcode, report);
                }
            }
            Task::Publish {
                target,
                items,
                options,
            } => {
                self.publish_service()
                    .publish(target, &items, &options)
                    .await?;
            }
            Task::PopulateSitemap { bibcodes, action } => {
                self.sitemap_service().populate(&bibcodes, action).await?;
            }
            Task::AugmentAffiliations { bibcode } => match &self.augmentation {
                Some(client) => {
                    client.request_augment(&bibcode).await?;
                    info!("Requested affiliation augmentation for {}", bibcode);
                }
                None => {
                    error!(
                        "No augmentation endpoint configured, dropping request for {}",
                        bibcode
                    );
                }
            },
        }
        Ok(())
    }
}
