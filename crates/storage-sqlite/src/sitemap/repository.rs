use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use super::model::{NewSitemapInfoDB, SitemapInfoDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::sitemap_info;
use recsync_core::sitemap::{SitemapInfo, SitemapRepositoryTrait};
use recsync_core::Result;

pub struct SitemapRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SitemapRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SitemapRepositoryTrait for SitemapRepository {
    fn get_sitemap_info(&self, bibcode: &str) -> Result<Option<SitemapInfo>> {
        let mut conn = get_connection(&self.pool)?;
        let row = sitemap_info::table
            .filter(sitemap_info::bibcode.eq(bibcode))
            .select(SitemapInfoDB::as_select())
            .first::<SitemapInfoDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(SitemapInfo::try_from).transpose()?)
    }

    async fn save_sitemap_info(&self, info: SitemapInfo) -> Result<SitemapInfo> {
        let row = NewSitemapInfoDB::from(&info);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SitemapInfo> {
                let existing = sitemap_info::table
                    .filter(sitemap_info::bibcode.eq(&row.bibcode))
                    .select(sitemap_info::id)
                    .first::<i64>(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                let saved = match existing {
                    Some(id) => diesel::update(sitemap_info::table.find(id))
                        .set(&row)
                        .returning(SitemapInfoDB::as_returning())
                        .get_result(conn),
                    None => diesel::insert_into(sitemap_info::table)
                        .values(&row)
                        .returning(SitemapInfoDB::as_returning())
                        .get_result(conn),
                }
                .map_err(StorageError::from)?;

                Ok(SitemapInfo::try_from(saved)?)
            })
            .await
    }

    async fn delete_all(&self) -> Result<usize> {
        self.writer
            .exec(|conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(sitemap_info::table)
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::records::RecordRepository;
    use chrono::Utc;
    use recsync_core::records::{FragmentKind, RecordRepositoryTrait};
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        records: RecordRepository,
        sitemaps: SitemapRepository,
    }

    fn setup() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.db");
        let (pool, writer) = db::open(path.to_str().unwrap()).unwrap();
        Fixture {
            _dir: dir,
            records: RecordRepository::new(pool.clone(), writer.clone()),
            sitemaps: SitemapRepository::new(pool, writer),
        }
    }

    async fn seed(fx: &Fixture, key: &str) -> i64 {
        fx.records
            .upsert_fragment(key, FragmentKind::BibData, Some(json!({"title": ["T"]})))
            .await
            .unwrap()
            .unwrap()
            .id
            .unwrap()
    }

    fn info(record_id: i64, key: &str, flag: bool) -> SitemapInfo {
        SitemapInfo {
            id: None,
            record_id,
            bibcode: key.to_string(),
            bib_data_updated: Some(Utc::now()),
            filename_lastmoddate: None,
            sitemap_filename: None,
            update_flag: flag,
        }
    }

    #[tokio::test]
    async fn test_save_inserts_then_updates_by_key() {
        let fx = setup();
        let record_id = seed(&fx, "K").await;

        let first = fx.sitemaps.save_sitemap_info(info(record_id, "K", true)).await.unwrap();
        assert!(first.id.is_some());

        let mut changed = first.clone();
        changed.update_flag = false;
        changed.sitemap_filename = Some("sitemap_bib_1.xml".to_string());
        let second = fx.sitemaps.save_sitemap_info(changed).await.unwrap();
        assert_eq!(second.id, first.id);

        let loaded = fx.sitemaps.get_sitemap_info("K").unwrap().unwrap();
        assert!(!loaded.update_flag);
        assert_eq!(loaded.sitemap_filename.as_deref(), Some("sitemap_bib_1.xml"));
        assert!(fx.sitemaps.get_sitemap_info("other").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rows_follow_record_deletion() {
        let fx = setup();
        let record_id = seed(&fx, "K").await;
        fx.sitemaps.save_sitemap_info(info(record_id, "K", true)).await.unwrap();

        fx.records.delete_record("K").await.unwrap();
        assert!(fx.sitemaps.get_sitemap_info("K").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_all_counts_rows() {
        let fx = setup();
        for key in ["A", "B"] {
            let id = seed(&fx, key).await;
            fx.sitemaps.save_sitemap_info(info(id, key, false)).await.unwrap();
        }
        assert_eq!(fx.sitemaps.delete_all().await.unwrap(), 2);
        assert_eq!(fx.sitemaps.delete_all().await.unwrap(), 0);
    }
}
