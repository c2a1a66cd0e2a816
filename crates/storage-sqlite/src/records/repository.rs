use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::Text;
use serde_json::Value;
use std::sync::Arc;

use super::model::RecordDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::records;
use crate::utils::{encode_payload, format_timestamp, parse_timestamp};
use recsync_core::records::{FragmentKind, Record, RecordFields, RecordRepositoryTrait, Target};
use recsync_core::Result;

pub struct RecordRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl RecordRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Select list loading only the payload columns in `fields`.
    fn select_list(fields: &RecordFields) -> String {
        let mut columns = vec!["id".to_string(), "bibcode".to_string()];
        for kind in FragmentKind::ALL {
            if fields.includes(kind) {
                columns.push(kind.as_str().to_string());
            } else {
                columns.push(format!("NULL AS {}", kind.as_str()));
            }
            columns.push(kind.updated_column().to_string());
        }
        columns.extend(
            [
                "created",
                "updated",
                "processed",
                "solr_checksum",
                "metrics_checksum",
                "datalinks_checksum",
            ]
            .map(String::from),
        );
        columns.join(", ")
    }
}

fn load_record(conn: &mut SqliteConnection, key: &str) -> Result<Option<Record>> {
    let row = records::table
        .filter(records::bibcode.eq(key))
        .select(RecordDB::as_select())
        .first::<RecordDB>(conn)
        .optional()
        .map_err(StorageError::from)?;
    Ok(row.map(Record::try_from).transpose()?)
}

#[async_trait]
impl RecordRepositoryTrait for RecordRepository {
    fn get_record(&self, bibcode: &str, fields: &RecordFields) -> Result<Option<Record>> {
        let mut conn = get_connection(&self.pool)?;
        let query = format!(
            "SELECT {} FROM records WHERE bibcode = ?",
            Self::select_list(fields)
        );
        let row = diesel::sql_query(query)
            .bind::<Text, _>(bibcode)
            .get_result::<RecordDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Record::try_from).transpose()?)
    }

    async fn upsert_fragment(
        &self,
        bibcode: &str,
        kind: FragmentKind,
        payload: Option<Value>,
    ) -> Result<Option<Record>> {
        let key = bibcode.to_string();
        let text = encode_payload(payload.as_ref())?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Option<Record>> {
                let now = format_timestamp(Utc::now());

                diesel::insert_or_ignore_into(records::table)
                    .values((
                        records::bibcode.eq(&key),
                        records::created.eq(&now),
                        records::updated.eq(&now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let target = records::table.filter(records::bibcode.eq(&key));
                let stamp = Some(now.clone());
                match kind {
                    FragmentKind::BibData => diesel::update(target)
                        .set((
                            records::bib_data.eq(&text),
                            records::bib_data_updated.eq(&stamp),
                            records::updated.eq(&now),
                        ))
                        .execute(conn),
                    FragmentKind::NonbibData => diesel::update(target)
                        .set((
                            records::nonbib_data.eq(&text),
                            records::nonbib_data_updated.eq(&stamp),
                            records::updated.eq(&now),
                        ))
                        .execute(conn),
                    FragmentKind::OrcidClaims => diesel::update(target)
                        .set((
                            records::orcid_claims.eq(&text),
                            records::orcid_claims_updated.eq(&stamp),
                            records::updated.eq(&now),
                        ))
                        .execute(conn),
                    FragmentKind::Metrics => diesel::update(target)
                        .set((
                            records::metrics.eq(&text),
                            records::metrics_updated.eq(&stamp),
                            records::updated.eq(&now),
                        ))
                        .execute(conn),
                    FragmentKind::Fulltext => diesel::update(target)
                        .set((
                            records::fulltext.eq(&text),
                            records::fulltext_updated.eq(&stamp),
                            records::updated.eq(&now),
                        ))
                        .execute(conn),
                    FragmentKind::Augments => diesel::update(target)
                        .set((
                            records::augments.eq(&text),
                            records::augments_updated.eq(&stamp),
                            records::updated.eq(&now),
                        ))
                        .execute(conn),
                }
                .map_err(StorageError::from)?;

                load_record(conn, &key)
            })
            .await
    }

    async fn delete_record(&self, bibcode: &str) -> Result<bool> {
        let key = bibcode.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<bool> {
                let deleted = diesel::delete(records::table.filter(records::bibcode.eq(key)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(deleted > 0)
            })
            .await
    }

    async fn commit_checksum(
        &self,
        bibcode: &str,
        target: Target,
        checksum: &str,
        processed: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let key = bibcode.to_string();
        let value = Some(checksum.to_string());
        let processed = processed.map(format_timestamp);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<bool> {
                let row = records::table.filter(records::bibcode.eq(&key));
                let updated = match target {
                    Target::SearchIndex => diesel::update(row)
                        .set(records::solr_checksum.eq(&value))
                        .execute(conn),
                    Target::Metrics => diesel::update(row)
                        .set(records::metrics_checksum.eq(&value))
                        .execute(conn),
                    Target::Links => diesel::update(row)
                        .set(records::datalinks_checksum.eq(&value))
                        .execute(conn),
                }
                .map_err(StorageError::from)?;

                if let (true, Some(at)) = (updated > 0, processed) {
                    diesel::update(records::table.filter(records::bibcode.eq(&key)))
                        .set(records::processed.eq(Some(at)))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(updated > 0)
            })
            .await
    }

    fn keys_updated_since(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<(String, DateTime<Utc>)>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = records::table
            .filter(records::updated.gt(format_timestamp(since)))
            .order((records::updated.asc(), records::id.asc()))
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .select((records::bibcode, records::updated))
            .load::<(String, String)>(&mut conn)
            .map_err(StorageError::from)?;
        let mut changed = Vec::with_capacity(rows.len());
        for (key, updated) in rows {
            changed.push((key, parse_timestamp(&updated)?));
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (TempDir, RecordRepository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.db");
        let (pool, writer) = db::open(path.to_str().unwrap()).unwrap();
        (dir, RecordRepository::new(pool, writer))
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates_single_fragment() {
        let (_dir, repo) = setup();

        let created = repo
            .upsert_fragment("2021AJ....1A", FragmentKind::BibData, Some(json!({"title": ["T"]})))
            .await
            .unwrap()
            .unwrap();
        assert!(created.id.is_some());
        assert!(created.bib_data_updated.is_some());
        assert!(created.nonbib_data_updated.is_none());

        let updated = repo
            .upsert_fragment("2021AJ....1A", FragmentKind::NonbibData, Some(json!({"n": 1})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.bib_data, Some(json!({"title": ["T"]})));
        assert_eq!(updated.bib_data_updated, created.bib_data_updated);
        assert_eq!(updated.nonbib_data, Some(json!({"n": 1})));
        assert_eq!(updated.created, created.created);
    }

    #[tokio::test]
    async fn test_clearing_fragment_keeps_timestamp() {
        let (_dir, repo) = setup();
        repo.upsert_fragment("K", FragmentKind::Fulltext, Some(json!({"body": "b"})))
            .await
            .unwrap();
        let cleared = repo
            .upsert_fragment("K", FragmentKind::Fulltext, None)
            .await
            .unwrap()
            .unwrap();
        assert!(cleared.fulltext.is_none());
        assert!(cleared.fulltext_updated.is_some());
    }

    #[tokio::test]
    async fn test_get_record_loads_only_selected_payloads() {
        let (_dir, repo) = setup();
        for kind in FragmentKind::ALL {
            repo.upsert_fragment("K", kind, Some(json!({"kind": kind.as_str()})))
                .await
                .unwrap();
        }

        let partial = repo
            .get_record("K", &RecordFields::for_targets(false, true, false))
            .unwrap()
            .unwrap();
        assert_eq!(partial.metrics, Some(json!({"kind": "metrics"})));
        assert!(partial.bib_data.is_none());
        assert!(partial.augments.is_none());
        assert!(partial.bib_data_updated.is_some());
        assert!(partial.augments_updated.is_some());

        let full = repo.get_record("K", &RecordFields::all()).unwrap().unwrap();
        assert_eq!(full.fulltext, Some(json!({"kind": "fulltext"})));

        assert!(repo.get_record("missing", &RecordFields::all()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_checksum_sets_processed_on_request() {
        let (_dir, repo) = setup();
        repo.upsert_fragment("K", FragmentKind::BibData, Some(json!({})))
            .await
            .unwrap();

        assert!(repo
            .commit_checksum("K", Target::Metrics, "m1", None)
            .await
            .unwrap());
        let r = repo.get_record("K", &RecordFields::none()).unwrap().unwrap();
        assert_eq!(r.metrics_checksum.as_deref(), Some("m1"));
        assert!(r.processed.is_none());

        // The stored processed time is the caller's read time, even when
        // that is earlier than the fragment write that just happened.
        let read_at = Utc::now() - chrono::Duration::minutes(10);
        repo.commit_checksum("K", Target::SearchIndex, "s1", Some(read_at))
            .await
            .unwrap();
        let r = repo.get_record("K", &RecordFields::none()).unwrap().unwrap();
        assert_eq!(r.solr_checksum.as_deref(), Some("s1"));
        assert_eq!(
            r.processed.map(format_timestamp),
            Some(format_timestamp(read_at))
        );
        assert!(r.processed < r.bib_data_updated);

        assert!(!repo
            .commit_checksum("gone", Target::Links, "l1", Some(read_at))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_delete_and_keys_updated_since() {
        let (_dir, repo) = setup();
        let before = Utc::now() - chrono::Duration::seconds(1);
        for key in ["A", "B", "C"] {
            repo.upsert_fragment(key, FragmentKind::BibData, Some(json!({})))
                .await
                .unwrap();
        }

        let changed = repo.keys_updated_since(before, 10).unwrap();
        let keys: Vec<&str> = changed.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
        assert!(changed.windows(2).all(|w| w[0].1 <= w[1].1));
        let c = repo.get_record("C", &RecordFields::none()).unwrap().unwrap();
        assert_eq!(c.updated, Some(changed[2].1));
        assert_eq!(repo.keys_updated_since(before, 1).unwrap().len(), 1);
        assert!(repo
            .keys_updated_since(Utc::now() + chrono::Duration::seconds(5), 10)
            .unwrap()
            .is_empty());

        assert!(repo.delete_record("B").await.unwrap());
        assert!(!repo.delete_record("B").await.unwrap());
        assert_eq!(repo.keys_updated_since(before, 10).unwrap().len(), 2);
    }
}
