//! Record Sync Downstream - HTTP clients for the systems records are published to.
//!
//! This crate implements the downstream traits of `recsync-core` over HTTP:
//! the search index update handler, the links resolver update endpoint and the
//! affiliation augmentation forwarder. The metrics store is a database and
//! lives in `recsync-storage-sqlite`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use recsync_downstream::{HttpSettings, SolrClient};
//!
//! let settings = HttpSettings::default();
//! let solr = SolrClient::new(vec!["http://localhost:9983/solr/collection1/update".into()], &settings)?;
//! let outcome = solr.upsert_documents(&items, None, false).await?;
//! ```

mod error;
mod forwarder;
mod http;
mod links;
mod solr;

#[cfg(test)]
mod test_server;

pub use error::{DownstreamError, Result};
pub use forwarder::HttpTaskForwarder;
pub use http::HttpSettings;
pub use links::LinksResolverHttpClient;
pub use solr::SolrClient;
