//! Metrics store backed by its own SQLite database.

mod store;

pub use store::{MetricsRowDB, SqliteMetricsStore};
