use std::time::Duration;

use recsync_core::tasks::{QueueName, TaskEnvelope};
use recsync_core::PipelineContext;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::sink::{QueueReceivers, QueueTaskSink};

/// Attempts per task, first run included.
pub const MAX_ATTEMPTS: u32 = 3;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Starts one worker per queue. Each stops when its channel closes.
pub fn spawn_workers(
    ctx: PipelineContext,
    sink: QueueTaskSink,
    receivers: QueueReceivers,
) -> Vec<JoinHandle<()>> {
    receivers
        .into_iter()
        .map(|(queue, rx)| tokio::spawn(run_queue(queue, rx, ctx.clone(), sink.clone())))
        .collect()
}

async fn run_queue(
    queue: QueueName,
    mut rx: mpsc::UnboundedReceiver<TaskEnvelope>,
    ctx: PipelineContext,
    sink: QueueTaskSink,
) {
    info!("Worker for queue {} started", queue);

    while let Some(envelope) = rx.recv().await {
        let id = envelope.id;
        let size = envelope.task.size();
        debug!(
            "Running task {} from {} (attempt {}, {} keys)",
            id,
            queue,
            envelope.attempt + 1,
            size
        );

        match ctx.run_task(envelope.task.clone()).await {
            Ok(()) => debug!("Task {} from {} done", id, queue),
            Err(e) if e.is_retryable() && envelope.attempt + 1 < MAX_ATTEMPTS => {
                let next = envelope.retry();
                let delay = RETRY_BASE_DELAY * 2u32.pow(next.attempt - 1);
                warn!(
                    "Task {} from {} failed, retrying in {:?}: {}",
                    id, queue, delay, e
                );
                let sink = sink.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Err(e) = sink.enqueue(next) {
                        error!("Could not requeue task {}: {}", id, e);
                    }
                });
            }
            Err(e) => error!(
                "Task {} from {} failed after {} attempts: {}",
                id,
                queue,
                envelope.attempt + 1,
                e
            ),
        }
    }

    info!("Worker for queue {} shutting down", queue);
}

#[cfg(test)]
mod tests {
    use super::*;
    use recsync_core::ingest::InboundMessage;
    use recsync_core::publish::InMemoryTarget;
    use recsync_core::records::InMemoryRecordRepository;
    use recsync_core::sitemap::InMemorySitemapRepository;
    use recsync_core::sync::SyncOptions;
    use recsync_core::tasks::{Task, TaskSink};
    use recsync_core::PipelineSettings;
    use serde_json::json;
    use std::sync::Arc;

    fn context(
        sink: &QueueTaskSink,
        records: &InMemoryRecordRepository,
        index: &InMemoryTarget,
    ) -> PipelineContext {
        PipelineContext {
            records: Arc::new(records.clone()),
            sitemaps: Arc::new(InMemorySitemapRepository::new()),
            search_index: Arc::new(index.clone()),
            metrics_store: Some(Arc::new(InMemoryTarget::new())),
            links_resolver: None,
            augmentation: None,
            tasks: Arc::new(sink.clone()),
            settings: PipelineSettings::default(),
        }
    }

    async fn wait_for(mut check: impl FnMut() -> bool) -> bool {
        for _ in 0..100 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_notification_flows_through_queues_to_index() {
        let (sink, receivers) = QueueTaskSink::new();
        let records = InMemoryRecordRepository::new();
        let index = InMemoryTarget::new();
        let ctx = context(&sink, &records, &index);
        spawn_workers(ctx, sink.clone(), receivers);

        let message: InboundMessage = serde_json::from_value(json!({
            "status": "active",
            "kind": "metadata",
            "bibcode": "2021AJ....1A",
            "payload": {"title": ["T"]}
        }))
        .unwrap();
        sink.submit(Task::UpdateRecord { message }).unwrap();

        assert!(wait_for(|| records.snapshot("2021AJ....1A").is_some()).await);
        assert!(index.is_empty());

        sink.submit(Task::IndexRecords {
            bibcodes: vec!["2021AJ....1A".into()],
            options: SyncOptions {
                force: true,
                ..Default::default()
            },
        })
        .unwrap();

        assert!(wait_for(|| index.get("2021AJ....1A").is_some()).await);
    }
}
