use serde_json::{Map, Value};

use crate::constants::{BIBCODE_FIELD, DATA_LINKS_ROWS_FIELD, IDENTIFIER_FIELD};
use crate::records::Record;

/// Builds the links-resolver payload of a record.
///
/// Returns `None` when `nonbib_data` carries no data-link rows: there is
/// nothing for the resolver to store.
pub fn build_links_payload(record: &Record) -> Option<Value> {
    let rows = record
        .nonbib_data
        .as_ref()
        .and_then(|nonbib| nonbib.get(DATA_LINKS_ROWS_FIELD))
        .and_then(Value::as_array)
        .filter(|rows| !rows.is_empty())?;

    let mut payload = Map::new();
    payload.insert(
        BIBCODE_FIELD.to_string(),
        Value::String(record.bibcode.clone()),
    );
    payload.insert(
        DATA_LINKS_ROWS_FIELD.to_string(),
        Value::Array(rows.clone()),
    );

    if let Some(bib) = record.bib_data.as_ref() {
        if let Some(identifier) = bib.get(IDENTIFIER_FIELD).filter(|v| v.is_array()) {
            payload.insert(IDENTIFIER_FIELD.to_string(), identifier.clone());
        }
        if let Some(doi) = bib.get("doi").filter(|v| !v.is_null()) {
            payload.insert("doi".to_string(), doi.clone());
        }
    }

    Some(Value::Object(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_rows_no_payload() {
        let mut r = Record::new("K");
        assert!(build_links_payload(&r).is_none());
        r.nonbib_data = Some(json!({"data_links_rows": []}));
        assert!(build_links_payload(&r).is_none());
    }

    #[test]
    fn test_payload_carries_rows_and_identifiers() {
        let mut r = Record::new("K");
        r.nonbib_data = Some(json!({"data_links_rows": [{"link_type": "DATA", "url": ["u"]}]}));
        r.bib_data = Some(json!({"identifier": ["K", "arXiv:1"], "doi": ["10.1/x"]}));

        let payload = build_links_payload(&r).unwrap();
        assert_eq!(payload["bibcode"], json!("K"));
        assert_eq!(payload["data_links_rows"][0]["link_type"], json!("DATA"));
        assert_eq!(payload["identifier"], json!(["K", "arXiv:1"]));
        assert_eq!(payload["doi"], json!(["10.1/x"]));
    }
}
