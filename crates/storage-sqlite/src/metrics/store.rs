use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::metrics;
use crate::utils::format_timestamp;
use recsync_core::publish::{MetricsStoreTrait, WriteOutcome};
use recsync_core::tasks::PublishItem;
use recsync_core::Result;

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::metrics)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MetricsRowDB {
    pub bibcode: String,
    pub payload: String,
    pub updated: String,
}

pub struct SqliteMetricsStore {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SqliteMetricsStore {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Stored payload of one key.
    pub fn get_metrics(&self, bibcode: &str) -> Result<Option<Value>> {
        let mut conn = get_connection(&self.pool)?;
        let row = metrics::table
            .find(bibcode)
            .select(MetricsRowDB::as_select())
            .first::<MetricsRowDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        match row {
            Some(row) => Ok(Some(
                serde_json::from_str(&row.payload).map_err(StorageError::from)?,
            )),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl MetricsStoreTrait for SqliteMetricsStore {
    /// Upserts every item. A row that fails to write is reported in `failed`
    /// without aborting the rest of the batch.
    async fn upsert_metrics(&self, items: &[PublishItem]) -> Result<WriteOutcome> {
        let now = format_timestamp(Utc::now());
        let mut outcome = WriteOutcome::default();
        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::to_string(&item.payload) {
                Ok(payload) => rows.push(MetricsRowDB {
                    bibcode: item.bibcode.clone(),
                    payload,
                    updated: now.clone(),
                }),
                Err(e) => {
                    warn!("Could not encode metrics of {}: {}", item.bibcode, e);
                    outcome.failed.push(item.bibcode.clone());
                }
            }
        }

        let written = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<WriteOutcome> {
                let mut written = WriteOutcome::default();
                for row in rows {
                    let result = diesel::insert_into(metrics::table)
                        .values(&row)
                        .on_conflict(metrics::bibcode)
                        .do_update()
                        .set(&row)
                        .execute(conn);
                    match result {
                        Ok(_) => written.succeeded.push(row.bibcode),
                        Err(e) => {
                            warn!("Metrics upsert failed for {}: {}", row.bibcode, e);
                            written.failed.push(row.bibcode);
                        }
                    }
                }
                Ok(written)
            })
            .await?;

        debug!(
            "Metrics store wrote {} rows, {} failed",
            written.succeeded.len(),
            written.failed.len() + outcome.failed.len()
        );
        outcome.merge(written);
        Ok(outcome)
    }

    async fn delete_metrics(&self, bibcode: &str) -> Result<bool> {
        let key = bibcode.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<bool> {
                let deleted = diesel::delete(metrics::table.find(key))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(deleted > 0)
            })
            .await
    }
}
