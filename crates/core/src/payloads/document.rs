use serde_json::{Map, Value};

use crate::constants::{BIBCODE_FIELD, DATA_LINKS_ROWS_FIELD, HAS_FIELDS, IDENTIFIER_FIELD};
use crate::records::Record;

/// Projects a record into a search-index document.
///
/// Must be deterministic: the document is fingerprinted to detect changes.
pub trait DocumentBuilder: Send + Sync {
    fn build(&self, record: &Record) -> Value;
}

/// Default document layout.
///
/// `bib_data` fields form the base document. Non-bibliographic fields are
/// merged on top, then claims, full text and affiliation augments are mapped
/// onto their index fields.
#[derive(Debug, Clone, Default)]
pub struct SearchDocumentBuilder {
    enable_has: bool,
}

impl SearchDocumentBuilder {
    pub fn new(enable_has: bool) -> Self {
        Self { enable_has }
    }
}

impl DocumentBuilder for SearchDocumentBuilder {
    fn build(&self, record: &Record) -> Value {
        let mut doc = Map::new();

        if let Some(Value::Object(bib)) = &record.bib_data {
            for (k, v) in bib {
                doc.insert(k.clone(), v.clone());
            }
        }
        doc.insert(
            BIBCODE_FIELD.to_string(),
            Value::String(record.bibcode.clone()),
        );
        if let Some(id) = record.id {
            doc.insert("id".to_string(), Value::from(id));
        }

        if let Some(Value::Object(nonbib)) = &record.nonbib_data {
            for (k, v) in nonbib {
                if k == BIBCODE_FIELD || k == DATA_LINKS_ROWS_FIELD {
                    continue;
                }
                doc.insert(k.clone(), v.clone());
            }
        }

        copy_mapped(
            &mut doc,
            record.orcid_claims.as_ref(),
            &[("verified", "orcid_user"), ("unverified", "orcid_other")],
        );
        copy_mapped(
            &mut doc,
            record.fulltext.as_ref(),
            &[("body", "body"), ("acknowledgements", "ack")],
        );
        copy_mapped(
            &mut doc,
            record.augments.as_ref(),
            &[
                ("aff", "aff"),
                ("aff_id", "aff_id"),
                ("institution", "institution"),
            ],
        );

        if self.enable_has {
            let has: Vec<Value> = HAS_FIELDS
                .iter()
                .filter(|field| doc.get(**field).is_some_and(has_content))
                .map(|field| Value::String((*field).to_string()))
                .collect();
            doc.insert("has".to_string(), Value::Array(has));
        }

        Value::Object(doc)
    }
}

fn copy_mapped(doc: &mut Map<String, Value>, source: Option<&Value>, fields: &[(&str, &str)]) {
    let Some(Value::Object(source)) = source else {
        return;
    };
    for (from, to) in fields {
        if let Some(value) = source.get(*from) {
            doc.insert((*to).to_string(), value.clone());
        }
    }
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => items.iter().any(has_content),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Makes sure the document's identifier list contains `key`.
///
/// Consumers look records up by identifier and assume the canonical key is
/// always among them.
pub fn ensure_self_identifier(doc: &mut Value, key: &str) {
    let Value::Object(map) = doc else {
        return;
    };
    let identifiers = map
        .entry(IDENTIFIER_FIELD.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !identifiers.is_array() {
        *identifiers = Value::Array(Vec::new());
    }
    if let Value::Array(list) = identifiers {
        if !list.iter().any(|v| v.as_str() == Some(key)) {
            list.push(Value::String(key.to_string()));
        }
    }
}
