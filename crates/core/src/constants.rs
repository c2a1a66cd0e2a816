/// Year assumed for `processed` when a record was never synchronized.
/// Any real fragment timestamp is newer.
pub const YEAR_ZERO: i32 = 1972;

/// Identifier list field of a search-index document
pub const IDENTIFIER_FIELD: &str = "identifier";

/// Canonical key field shared by every payload
pub const BIBCODE_FIELD: &str = "bibcode";

/// Field holding the data-link rows inside `nonbib_data`
pub const DATA_LINKS_ROWS_FIELD: &str = "data_links_rows";

/// Document fields summarized in the `has` field of a search-index document
pub const HAS_FIELDS: &[&str] = &[
    "abstract",
    "ack",
    "aff",
    "aff_id",
    "author",
    "bibgroup",
    "body",
    "citation_count",
    "comment",
    "database",
    "doctype",
    "doi",
    "first_author",
    "identifier",
    "institution",
    "issue",
    "keywords",
    "orcid_other",
    "orcid_pub",
    "orcid_user",
    "origin",
    "property",
    "pub",
    "pub_raw",
    "publisher",
    "references",
    "title",
    "uat",
    "volume",
];

/// Default number of keys carried by one periodic index-records task
pub const DEFAULT_SYNC_BATCH_SIZE: usize = 100;
