//! Utility functions for SQLite storage operations.

use chrono::{DateTime, Utc};

use crate::errors::StorageError;

/// Fixed-width RFC 3339 form, so text comparison orders like time.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StorageError> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

pub fn parse_optional_timestamp(
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, StorageError> {
    value.map(parse_timestamp).transpose()
}

/// Serializes a payload for a TEXT column. JSON `null` is stored as SQL NULL.
pub fn encode_payload(payload: Option<&serde_json::Value>) -> Result<Option<String>, StorageError> {
    payload
        .filter(|v| !v.is_null())
        .map(serde_json::to_string)
        .transpose()
        .map_err(StorageError::from)
}

pub fn decode_payload(text: Option<&str>) -> Result<Option<serde_json::Value>, StorageError> {
    text.map(serde_json::from_str)
        .transpose()
        .map_err(StorageError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_timestamps_are_fixed_width_and_ordered() {
        let a = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let b = a + chrono::Duration::microseconds(1);
        let (fa, fb) = (format_timestamp(a), format_timestamp(b));
        assert_eq!(fa, "2024-01-02T03:04:05.000000Z");
        assert_eq!(fa.len(), fb.len());
        assert!(fa < fb);
        assert_eq!(parse_timestamp(&fb).unwrap(), b);
    }

    #[test]
    fn test_payload_encoding() {
        assert_eq!(encode_payload(None).unwrap(), None);
        assert_eq!(encode_payload(Some(&json!(null))).unwrap(), None);
        let text = encode_payload(Some(&json!({"a": [1]}))).unwrap().unwrap();
        assert_eq!(decode_payload(Some(&text)).unwrap(), Some(json!({"a": [1]})));
        assert!(decode_payload(Some("{")).is_err());
    }
}
