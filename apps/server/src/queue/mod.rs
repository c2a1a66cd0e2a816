//! In-process task queues.
//!
//! One unbounded channel per named queue. Services submit through
//! `QueueTaskSink` without waiting; one worker per queue runs the tasks in
//! FIFO order against the pipeline context.

mod sink;
mod worker;

pub use sink::{QueueReceivers, QueueTaskSink};
pub use worker::{spawn_workers, MAX_ATTEMPTS};
