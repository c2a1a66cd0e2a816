use log::{debug, error, warn};
use std::sync::Arc;

use super::ingest_model::{InboundMessage, Notification, NotificationStatus, UpdateReport};
use crate::deletion::DeletionService;
use crate::errors::{Error, Result, ValidationError};
use crate::records::RecordRepositoryTrait;
use crate::tasks::{Task, TaskSink};

/// Applies change notifications to the record store.
pub struct RecordUpdateService {
    records: Arc<dyn RecordRepositoryTrait>,
    deletion: DeletionService,
    tasks: Arc<dyn TaskSink>,
}

impl RecordUpdateService {
    pub fn new(
        records: Arc<dyn RecordRepositoryTrait>,
        deletion: DeletionService,
        tasks: Arc<dyn TaskSink>,
    ) -> Self {
        Self {
            records,
            deletion,
            tasks,
        }
    }

    /// Handles one notification.
    ///
    /// An unrecognized status is logged and the message dropped. A message
    /// that names an unknown kind or lacks a key is rejected with a
    /// validation error. Store failures propagate and may be retried.
    pub async fn handle_message(&self, msg: &InboundMessage) -> Result<UpdateReport> {
        debug!("Updating record: {:?}", msg);

        let status = match msg.status() {
            Ok(status) => status,
            Err(e) => {
                error!("Received a message with unclear status: {:?} ({})", msg, e);
                return Ok(UpdateReport::dropped(e.to_string()));
            }
        };

        let notification = msg.parse().map_err(|e: ValidationError| {
            error!("Rejected notification of kind '{}': {}", msg.kind, e);
            Error::Validation(e)
        })?;
        let kind = notification.fragment_kind();

        if status == NotificationStatus::Active {
            if let Some(item) = notification.items().into_iter().find(|i| i.payload.is_none()) {
                error!("Active {} notification for {} has no payload", kind, item.bibcode);
                return Err(ValidationError::MissingField("payload".to_string()).into());
            }
        }

        let mut report = UpdateReport {
            kind: Some(kind),
            ..Default::default()
        };

        match (status, &notification) {
            (NotificationStatus::Deleted, Notification::Metadata(item)) => {
                report.deletion = Some(self.deletion.delete_record(&item.bibcode).await);
                report.touched.push(item.bibcode.clone());
            }
            (NotificationStatus::Deleted, _) => {
                for item in notification.items() {
                    let record = self
                        .records
                        .upsert_fragment(&item.bibcode, kind, None)
                        .await?;
                    if record.is_some() {
                        debug!("Deleted {} of {}", kind, item.bibcode);
                    }
                    report.touched.push(item.bibcode.clone());
                }
            }
            (NotificationStatus::Active, _) => {
                for item in notification.items() {
                    let record = self
                        .records
                        .upsert_fragment(&item.bibcode, kind, item.payload.clone())
                        .await?;
                    if record.is_some() {
                        debug!("Saved {} of {}", kind, item.bibcode);
                    }
                    report.touched.push(item.bibcode.clone());
                }

                if let Notification::Metadata(item) = &notification {
                    debug!("Requesting affiliation augmentation for {}", item.bibcode);
                    let task = Task::AugmentAffiliations {
                        bibcode: item.bibcode.clone(),
                    };
                    match self.tasks.submit(task) {
                        Ok(()) => report.augmentation_requested.push(item.bibcode.clone()),
                        Err(e) => warn!(
                            "Could not request augmentation for {}: {}",
                            item.bibcode, e
                        ),
                    }
                }
            }
        }

        Ok(report)
    }
}
