use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::{format_timestamp, parse_optional_timestamp};
use recsync_core::sitemap::SitemapInfo;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::sitemap_info)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SitemapInfoDB {
    pub id: i64,
    pub record_id: i64,
    pub bibcode: String,
    pub bib_data_updated: Option<String>,
    pub filename_lastmoddate: Option<String>,
    pub sitemap_filename: Option<String>,
    pub update_flag: bool,
}

/// Insert and update shape. `id` is assigned by the database.
#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::sitemap_info)]
#[diesel(treat_none_as_null = true)]
pub struct NewSitemapInfoDB {
    pub record_id: i64,
    pub bibcode: String,
    pub bib_data_updated: Option<String>,
    pub filename_lastmoddate: Option<String>,
    pub sitemap_filename: Option<String>,
    pub update_flag: bool,
}

impl TryFrom<SitemapInfoDB> for SitemapInfo {
    type Error = StorageError;

    fn try_from(db: SitemapInfoDB) -> Result<Self, Self::Error> {
        Ok(SitemapInfo {
            id: Some(db.id),
            record_id: db.record_id,
            bibcode: db.bibcode,
            bib_data_updated: parse_optional_timestamp(db.bib_data_updated.as_deref())?,
            filename_lastmoddate: parse_optional_timestamp(db.filename_lastmoddate.as_deref())?,
            sitemap_filename: db.sitemap_filename,
            update_flag: db.update_flag,
        })
    }
}

impl From<&SitemapInfo> for NewSitemapInfoDB {
    fn from(info: &SitemapInfo) -> Self {
        Self {
            record_id: info.record_id,
            bibcode: info.bibcode.clone(),
            bib_data_updated: info.bib_data_updated.map(format_timestamp),
            filename_lastmoddate: info.filename_lastmoddate.map(format_timestamp),
            sitemap_filename: info.sitemap_filename.clone(),
            update_flag: info.update_flag,
        }
    }
}
