use std::collections::HashMap;

use recsync_core::errors::{Error, Result};
use recsync_core::tasks::{QueueName, Task, TaskEnvelope, TaskSink};
use tokio::sync::mpsc;

/// Receiving ends of every queue, handed to the workers.
pub type QueueReceivers = HashMap<QueueName, mpsc::UnboundedReceiver<TaskEnvelope>>;

/// Task sink backed by unbounded tokio channels.
#[derive(Clone)]
pub struct QueueTaskSink {
    senders: HashMap<QueueName, mpsc::UnboundedSender<TaskEnvelope>>,
}

impl QueueTaskSink {
    /// Creates the channels of every named queue.
    pub fn new() -> (Self, QueueReceivers) {
        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();
        for queue in QueueName::ALL {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.insert(queue, tx);
            receivers.insert(queue, rx);
        }
        (Self { senders }, receivers)
    }

    /// Puts an envelope back on its queue, keeping its id and attempt count.
    pub fn enqueue(&self, envelope: TaskEnvelope) -> Result<()> {
        let queue = envelope.task.queue();
        let sender = self
            .senders
            .get(&queue)
            .ok_or_else(|| Error::Queue(format!("no channel for queue {}", queue)))?;
        sender
            .send(envelope)
            .map_err(|_| Error::Queue(format!("queue {} is closed", queue)))
    }
}

impl TaskSink for QueueTaskSink {
    fn submit(&self, task: Task) -> Result<()> {
        let envelope = TaskEnvelope::new(task);
        tracing::debug!(
            "Submitting task {} to {} ({} keys, priority {})",
            envelope.id,
            envelope.task.queue(),
            envelope.task.size(),
            envelope.task.priority()
        );
        self.enqueue(envelope)
    }
}
