//! Deletion pipeline - best-effort removal from every system holding a record.

mod deletion_model;
mod deletion_service;

pub use deletion_model::{DeletionReport, StepOutcome};
pub use deletion_service::DeletionService;
