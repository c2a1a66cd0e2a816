//! Record Sync Core - domain models, services, and traits.
//!
//! This crate holds the selective record synchronization pipeline: the
//! readiness gate, the fingerprint engine, the dispatcher and the services
//! around it. It is storage-agnostic and defines traits that are implemented
//! by the `storage-sqlite` and `downstream` crates.

pub mod constants;
pub mod context;
pub mod deletion;
pub mod errors;
pub mod ingest;
pub mod payloads;
pub mod publish;
pub mod records;
pub mod sitemap;
pub mod sync;
pub mod tasks;

pub use context::{PipelineContext, PipelineSettings};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
