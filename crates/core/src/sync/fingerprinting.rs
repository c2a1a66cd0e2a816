//! Fingerprint engine.
//!
//! A fingerprint is the hex SHA-256 of a payload's canonical JSON form: object
//! keys sorted at every depth, no whitespace. Two payloads with equal content
//! always share a fingerprint, whatever order their keys were inserted in.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::records::{Record, Target};

/// Serializes `value` with object keys sorted recursively.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

pub fn fingerprint(payload: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(payload).as_bytes());
    hex::encode(hasher.finalize())
}

/// Null, `{}`, `[]` and `""` carry nothing worth publishing.
pub fn is_empty_payload(payload: Option<&Value>) -> bool {
    match payload {
        None | Some(Value::Null) => true,
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Decides whether `payload` must be written to `target`.
///
/// Returns the payload fingerprint either way. A record without metrics data
/// never publishes to the metrics store, even when fingerprints are ignored.
pub fn should_publish(
    target: Target,
    record: &Record,
    payload: &Value,
    ignore_fingerprints: bool,
) -> (bool, String) {
    let digest = fingerprint(payload);

    if target == Target::Metrics && is_empty_payload(record.metrics.as_ref()) {
        return (false, digest);
    }

    let changed = ignore_fingerprints || record.checksum(target) != Some(digest.as_str());
    (changed, digest)
}
