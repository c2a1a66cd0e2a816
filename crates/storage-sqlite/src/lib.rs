//! SQLite storage implementation for the record sync pipeline.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `recsync-core` and contains:
//! - Database connection pooling and the single-writer actor
//! - Diesel migrations for the record store and the metrics store
//! - Repository implementations for records, sitemap rows and metrics
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! `core` is database-agnostic and works with traits.
//!
//! ```text
//!        core (domain)
//!              │
//!              ▼
//!   storage-sqlite (this crate)
//!        │            │
//!        ▼            ▼
//!   records DB    metrics DB
//! ```

pub mod db;
pub mod errors;
pub mod metrics;
pub mod records;
pub mod schema;
pub mod sitemap;
pub mod utils;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, open, open_metrics, run_metrics_migrations, run_migrations,
    DbConnection, DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use metrics::SqliteMetricsStore;
pub use records::RecordRepository;
pub use sitemap::SitemapRepository;

// Re-export from recsync-core for convenience
pub use recsync_core::errors::{DatabaseError, Error, Result};
