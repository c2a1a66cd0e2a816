//! Payload builders - projections of a record into per-target payloads.

mod document;
mod links;

pub use document::{ensure_self_identifier, DocumentBuilder, SearchDocumentBuilder};
pub use links::build_links_payload;
