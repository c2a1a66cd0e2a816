//! Connection pooling, migrations and the single-writer actor.

use log::{error, info};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::errors::{IntoCore, StorageError};
use recsync_core::errors::{DatabaseError, Error, Result};

pub mod write_actor;
pub use write_actor::{spawn_writer, WriteHandle};

/// Record store schema: `records` and `sitemap_info`.
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Metrics store schema, applied to its own database file.
const METRICS_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations_metrics");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Prepares the database file: creates its directory and switches it to WAL.
pub fn init(db_path: &str) -> Result<String> {
    if let Some(dir) = Path::new(db_path).parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }

    let mut conn = SqliteConnection::establish(db_path)
        .map_err(|e| Error::from(StorageError::ConnectionFailed(e)))?;
    conn.batch_execute(
        "
            PRAGMA journal_mode = WAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 30000;
            PRAGMA synchronous = NORMAL;
        ",
    )
    .into_core()?;

    Ok(db_path.to_string())
}

pub fn create_pool(db_path: &str) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = Pool::builder()
        .max_size(8)
        .min_idle(Some(1))
        .connection_timeout(Duration::from_secs(30))
        .connection_customizer(Box::new(ConnectionCustomizer))
        .build(manager)
        .map_err(|e| Error::Database(DatabaseError::PoolCreationFailed(e.to_string())))?;
    Ok(Arc::new(pool))
}

pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    pool.get().into_core()
}

pub fn run_migrations(pool: &DbPool) -> Result<()> {
    apply(pool, MIGRATIONS, "record store")
}

pub fn run_metrics_migrations(pool: &DbPool) -> Result<()> {
    apply(pool, METRICS_MIGRATIONS, "metrics store")
}

fn apply(pool: &DbPool, migrations: EmbeddedMigrations, name: &str) -> Result<()> {
    info!("Running {} migrations", name);
    let mut connection = get_connection(pool)?;

    let applied = connection.run_pending_migrations(migrations).map_err(|e| {
        error!("{} migration failed: {}", name, e);
        Error::from(StorageError::MigrationFailed(e.to_string()))
    })?;

    if applied.is_empty() {
        info!("No pending {} migrations to apply.", name);
    } else {
        for version in &applied {
            info!("Applied {} migration {}", name, version);
        }
    }
    Ok(())
}

/// Opens and migrates the record store: pool plus writer actor.
///
/// Must be called inside a tokio runtime.
pub fn open(db_path: &str) -> Result<(Arc<DbPool>, WriteHandle)> {
    let pool = create_pool(&init(db_path)?)?;
    run_migrations(&pool)?;
    let writer = spawn_writer(pool.as_ref().clone());
    Ok((pool, writer))
}

/// Same as [`open`] for the metrics store database.
pub fn open_metrics(db_path: &str) -> Result<(Arc<DbPool>, WriteHandle)> {
    let pool = create_pool(&init(db_path)?)?;
    run_metrics_migrations(&pool)?;
    let writer = spawn_writer(pool.as_ref().clone());
    Ok((pool, writer))
}

#[derive(Debug)]
struct ConnectionCustomizer;

impl r2d2::CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), r2d2::Error> {
        conn.batch_execute(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 30000;
            PRAGMA synchronous = NORMAL;
        ",
        )
        .map_err(r2d2::Error::QueryError)
    }
}
