//! Database model for records.

use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::{decode_payload, parse_optional_timestamp, parse_timestamp};
use recsync_core::records::Record;

/// Row of the `records` table.
///
/// Loaded through `sql_query` so that unselected payload columns can be
/// replaced by `NULL` in the select list.
#[derive(Queryable, QueryableByName, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RecordDB {
    pub id: i64,
    pub bibcode: String,
    pub bib_data: Option<String>,
    pub bib_data_updated: Option<String>,
    pub nonbib_data: Option<String>,
    pub nonbib_data_updated: Option<String>,
    pub orcid_claims: Option<String>,
    pub orcid_claims_updated: Option<String>,
    pub metrics: Option<String>,
    pub metrics_updated: Option<String>,
    pub fulltext: Option<String>,
    pub fulltext_updated: Option<String>,
    pub augments: Option<String>,
    pub augments_updated: Option<String>,
    pub created: String,
    pub updated: String,
    pub processed: Option<String>,
    pub solr_checksum: Option<String>,
    pub metrics_checksum: Option<String>,
    pub datalinks_checksum: Option<String>,
}

impl TryFrom<RecordDB> for Record {
    type Error = StorageError;

    fn try_from(db: RecordDB) -> Result<Self, Self::Error> {
        Ok(Record {
            id: Some(db.id),
            bibcode: db.bibcode,
            bib_data: decode_payload(db.bib_data.as_deref())?,
            bib_data_updated: parse_optional_timestamp(db.bib_data_updated.as_deref())?,
            nonbib_data: decode_payload(db.nonbib_data.as_deref())?,
            nonbib_data_updated: parse_optional_timestamp(db.nonbib_data_updated.as_deref())?,
            orcid_claims: decode_payload(db.orcid_claims.as_deref())?,
            orcid_claims_updated: parse_optional_timestamp(db.orcid_claims_updated.as_deref())?,
            metrics: decode_payload(db.metrics.as_deref())?,
            metrics_updated: parse_optional_timestamp(db.metrics_updated.as_deref())?,
            fulltext: decode_payload(db.fulltext.as_deref())?,
            fulltext_updated: parse_optional_timestamp(db.fulltext_updated.as_deref())?,
            augments: decode_payload(db.augments.as_deref())?,
            augments_updated: parse_optional_timestamp(db.augments_updated.as_deref())?,
            created: Some(parse_timestamp(&db.created)?),
            updated: Some(parse_timestamp(&db.updated)?),
            processed: parse_optional_timestamp(db.processed.as_deref())?,
            solr_checksum: db.solr_checksum,
            metrics_checksum: db.metrics_checksum,
            datalinks_checksum: db.datalinks_checksum,
        })
    }
}
