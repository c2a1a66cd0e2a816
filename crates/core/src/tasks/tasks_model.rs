use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::ingest::InboundMessage;
use crate::records::Target;
use crate::sitemap::SitemapAction;
use crate::sync::SyncOptions;

/// Named queues. Each one is drained by its own worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueName {
    UpdateRecord,
    IndexRecords,
    RebuildIndex,
    DeleteRecords,
    IndexSolr,
    IndexMetrics,
    IndexDataLinksResolver,
    PopulateSitemapTable,
    AugmentAffiliations,
}

impl QueueName {
    pub const ALL: [QueueName; 9] = [
        QueueName::UpdateRecord,
        QueueName::IndexRecords,
        QueueName::RebuildIndex,
        QueueName::DeleteRecords,
        QueueName::IndexSolr,
        QueueName::IndexMetrics,
        QueueName::IndexDataLinksResolver,
        QueueName::PopulateSitemapTable,
        QueueName::AugmentAffiliations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueName::UpdateRecord => "update-record",
            QueueName::IndexRecords => "index-records",
            QueueName::RebuildIndex => "rebuild-index",
            QueueName::DeleteRecords => "delete-records",
            QueueName::IndexSolr => "index-solr",
            QueueName::IndexMetrics => "index-metrics",
            QueueName::IndexDataLinksResolver => "index-data-links-resolver",
            QueueName::PopulateSitemapTable => "populate-sitemap-table",
            QueueName::AugmentAffiliations => "augment-affiliations",
        }
    }

    /// Publication queue feeding `target`.
    pub fn for_target(target: Target) -> Self {
        match target {
            Target::SearchIndex => QueueName::IndexSolr,
            Target::Metrics => QueueName::IndexMetrics,
            Target::Links => QueueName::IndexDataLinksResolver,
        }
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One changed payload on its way to a downstream target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishItem {
    pub bibcode: String,
    pub payload: Value,
    pub fingerprint: String,
    /// When the record state behind `payload` was read. Committed as the
    /// record's `processed` time, never a later one.
    pub observed_at: DateTime<Utc>,
}

/// Options forwarded from a synchronize call to its publish tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOptions {
    pub commit: bool,
    pub index_targets: Option<Vec<String>>,
    pub update_processed: bool,
    pub priority: i32,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            commit: false,
            index_targets: None,
            update_processed: true,
            priority: 0,
        }
    }
}

/// Unit of work carried by a queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "kebab-case")]
pub enum Task {
    UpdateRecord {
        message: InboundMessage,
    },
    IndexRecords {
        bibcodes: Vec<String>,
        options: SyncOptions,
    },
    RebuildIndex {
        bibcodes: Vec<String>,
        index_targets: Option<Vec<String>>,
    },
    DeleteRecord {
        bibcode: String,
    },
    Publish {
        target: Target,
        items: Vec<PublishItem>,
        options: PublishOptions,
    },
    PopulateSitemap {
        bibcodes: Vec<String>,
        action: SitemapAction,
    },
    AugmentAffiliations {
        bibcode: String,
    },
}

impl Task {
    pub fn queue(&self) -> QueueName {
        match self {
            Task::UpdateRecord { .. } => QueueName::UpdateRecord,
            Task::IndexRecords { .. } => QueueName::IndexRecords,
            Task::RebuildIndex { .. } => QueueName::RebuildIndex,
            Task::DeleteRecord { .. } => QueueName::DeleteRecords,
            Task::Publish { target, .. } => QueueName::for_target(*target),
            Task::PopulateSitemap { .. } => QueueName::PopulateSitemapTable,
            Task::AugmentAffiliations { .. } => QueueName::AugmentAffiliations,
        }
    }

    /// Priority hint. Only synchronize and publish tasks carry one.
    pub fn priority(&self) -> i32 {
        match self {
            Task::IndexRecords { options, .. } => options.priority,
            Task::Publish { options, .. } => options.priority,
            _ => 0,
        }
    }

    /// Number of keys the task covers, for log lines.
    pub fn size(&self) -> usize {
        match self {
            Task::UpdateRecord { message } => message.keys().len(),
            Task::IndexRecords { bibcodes, .. }
            | Task::RebuildIndex { bibcodes, .. }
            | Task::PopulateSitemap { bibcodes, .. } => bibcodes.len(),
            Task::Publish { items, .. } => items.len(),
            Task::DeleteRecord { .. } | Task::AugmentAffiliations { .. } => 1,
        }
    }
}

/// A task as it travels through a queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEnvelope {
    pub id: Uuid,
    pub task: Task,
    pub submitted_at: DateTime<Utc>,
    pub attempt: u32,
}

impl TaskEnvelope {
    pub fn new(task: Task) -> Self {
        Self {
            id: Uuid::new_v4(),
            task,
            submitted_at: Utc::now(),
            attempt: 0,
        }
    }

    /// Same task, next attempt.
    pub fn retry(mut self) -> Self {
        self.attempt += 1;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_names() {
        assert_eq!(QueueName::IndexDataLinksResolver.as_str(), "index-data-links-resolver");
        assert_eq!(
            serde_json::to_string(&QueueName::PopulateSitemapTable).unwrap(),
            "\"populate-sitemap-table\""
        );
        let names: std::collections::HashSet<&str> =
            QueueName::ALL.iter().map(|q| q.as_str()).collect();
        assert_eq!(names.len(), 9);
    }

    #[test]
    fn test_publish_task_routes_by_target() {
        let task = Task::Publish {
            target: Target::Links,
            items: vec![],
            options: PublishOptions {
                priority: 5,
                ..Default::default()
            },
        };
        assert_eq!(task.queue(), QueueName::IndexDataLinksResolver);
        assert_eq!(task.priority(), 5);
    }

    #[test]
    fn test_envelope_retry_counts_attempts() {
        let env = TaskEnvelope::new(Task::DeleteRecord {
            bibcode: "K".into(),
        });
        let id = env.id;
        let env = env.retry().retry();
        assert_eq!(env.attempt, 2);
        assert_eq!(env.id, id);
    }

    #[test]
    fn test_task_serializes_with_tag() {
        let task = Task::AugmentAffiliations {
            bibcode: "K".into(),
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["task"], "augment-affiliations");
        assert_eq!(json["bibcode"], "K");
    }
}
