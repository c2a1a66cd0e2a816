//! Task queue - the closed set of pipeline tasks and how they are submitted.

mod sink;
mod tasks_model;

pub use sink::{MockTaskSink, TaskSink};
pub use tasks_model::{PublishItem, PublishOptions, QueueName, Task, TaskEnvelope};
