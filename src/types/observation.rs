//! Checkpoint observations and the timestamp representations they arrive in
//!
//! Organizer-entered data reaches the engine in several shapes: typed date/time
//! values from Rust callers, document-store timestamp objects exposing an
//! epoch-seconds field, and loosely typed JSON (numbers, date strings). Every
//! shape converts to whole epoch seconds or to nothing at all.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Largest magnitude, in milliseconds, that a date constructor accepts.
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

/// Field holding the observed instant on a timestamp record.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// A timestamp-like value in any supported external representation.
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampLike {
    /// Native date/time value.
    Native(DateTime<Utc>),
    /// Value already expressed in epoch seconds.
    EpochSeconds(i64),
    /// Anything else, interpreted permissively when read.
    Raw(Value),
}

impl TimestampLike {
    /// Whole epoch seconds for this value, or `None` when it cannot be read.
    ///
    /// Raw values follow these rules:
    /// - objects with a numeric `seconds` (or `_seconds`) field use that field
    /// - numbers are epoch milliseconds
    /// - strings are RFC 3339, RFC 2822, `YYYY-MM-DD HH:MM:SS[.fff]` or `YYYY-MM-DD` (UTC)
    /// - everything else is unreadable
    ///
    /// Fractional values are floored.
    pub fn epoch_seconds(&self) -> Option<i64> {
        match self {
            TimestampLike::Native(at) => Some(at.timestamp()),
            TimestampLike::EpochSeconds(secs) => Some(*secs),
            TimestampLike::Raw(value) => raw_epoch_seconds(value),
        }
    }
}

impl From<DateTime<Utc>> for TimestampLike {
    fn from(value: DateTime<Utc>) -> Self {
        TimestampLike::Native(value)
    }
}

impl From<Value> for TimestampLike {
    fn from(value: Value) -> Self {
        TimestampLike::Raw(value)
    }
}

impl<'de> Deserialize<'de> for TimestampLike {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(TimestampLike::Raw)
    }
}

impl Serialize for TimestampLike {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            TimestampLike::Native(at) => at.serialize(serializer),
            TimestampLike::EpochSeconds(secs) => {
                serde_json::json!({ "seconds": secs, "nanoseconds": 0 }).serialize(serializer)
            }
            TimestampLike::Raw(value) => value.serialize(serializer),
        }
    }
}

fn raw_epoch_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Object(map) => map
            .get("seconds")
            .or_else(|| map.get("_seconds"))
            .and_then(Value::as_f64)
            .and_then(floor_to_i64),
        Value::Number(n) => {
            if let Some(millis) = n.as_i64() {
                return (millis.unsigned_abs() as f64 <= MAX_EPOCH_MILLIS).then(|| millis.div_euclid(1000));
            }
            n.as_f64()
                .filter(|millis| millis.abs() <= MAX_EPOCH_MILLIS)
                .and_then(|millis| floor_to_i64(millis / 1000.0))
        }
        Value::String(text) => parse_date_string(text),
        Value::Null | Value::Bool(_) | Value::Array(_) => None,
    }
}

fn floor_to_i64(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let floored = value.floor();
    (floored >= i64::MIN as f64 && floored <= i64::MAX as f64).then_some(floored as i64)
}

fn parse_date_string(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.timestamp());
    }
    if let Ok(at) = DateTime::parse_from_rfc2822(text) {
        return Some(at.timestamp());
    }
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp())
}

/// One observation record, either embedded on a competitor or stored in the
/// competitor's timestamp sub-collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    #[serde(default)]
    pub timestamp: Option<TimestampLike>,
}

impl ObservationRecord {
    /// Observation at a native instant.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self { timestamp: Some(TimestampLike::Native(instant)) }
    }

    /// Observation at an instant given in epoch seconds.
    pub fn epoch_seconds(secs: i64) -> Self {
        Self { timestamp: Some(TimestampLike::EpochSeconds(secs)) }
    }

    /// Observation carrying an arbitrary raw value.
    pub fn raw(value: Value) -> Self {
        Self { timestamp: Some(TimestampLike::Raw(value)) }
    }

    /// Decode a raw record document. Records without a `timestamp` field decode
    /// to an observation with no instant.
    pub fn from_document(document: &Value) -> Self {
        let timestamp = document
            .get(TIMESTAMP_FIELD)
            .filter(|value| !value.is_null())
            .cloned()
            .map(TimestampLike::Raw);
        Self { timestamp }
    }

    /// Whole epoch seconds of this observation, if readable.
    pub fn epoch_seconds_value(&self) -> Option<i64> {
        self.timestamp.as_ref().and_then(TimestampLike::epoch_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn native_and_epoch_values_convert_directly() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        assert_eq!(TimestampLike::Native(at).epoch_seconds(), Some(at.timestamp()));
        assert_eq!(TimestampLike::EpochSeconds(-5).epoch_seconds(), Some(-5));
    }

    #[test]
    fn store_timestamp_objects_use_their_seconds_field() {
        let ts = TimestampLike::Raw(json!({ "seconds": 1_700_000_000, "nanoseconds": 999_000_000 }));
        assert_eq!(ts.epoch_seconds(), Some(1_700_000_000));

        let admin_sdk = TimestampLike::Raw(json!({ "_seconds": 1_700_000_001, "_nanoseconds": 0 }));
        assert_eq!(admin_sdk.epoch_seconds(), Some(1_700_000_001));

        let fractional = TimestampLike::Raw(json!({ "seconds": 12.9 }));
        assert_eq!(fractional.epoch_seconds(), Some(12));

        let wrong_type = TimestampLike::Raw(json!({ "seconds": "12" }));
        assert_eq!(wrong_type.epoch_seconds(), None);
    }

    #[test]
    fn numbers_are_epoch_milliseconds() {
        assert_eq!(TimestampLike::Raw(json!(1_700_000_000_999i64)).epoch_seconds(), Some(1_700_000_000));
        assert_eq!(TimestampLike::Raw(json!(-1)).epoch_seconds(), Some(-1));
        assert_eq!(TimestampLike::Raw(json!(1500.7)).epoch_seconds(), Some(1));
        assert_eq!(TimestampLike::Raw(json!(9e15)).epoch_seconds(), None);
    }

    #[test]
    fn date_strings_parse_in_common_forms() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 15).unwrap().timestamp();
        for text in [
            "2025-03-01T09:30:15Z",
            "2025-03-01T10:30:15+01:00",
            "2025-03-01T09:30:15.750Z",
            "Sat, 01 Mar 2025 09:30:15 +0000",
            "2025-03-01 09:30:15",
            "2025-03-01T09:30:15",
            "2025-03-01T09:30:15.500",
            "2025-03-01 09:30:15.999",
        ] {
            assert_eq!(TimestampLike::Raw(json!(text)).epoch_seconds(), Some(expected), "{text}");
        }

        let midnight = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap().timestamp();
        assert_eq!(TimestampLike::Raw(json!("2025-03-01")).epoch_seconds(), Some(midnight));
    }

    #[test]
    fn unreadable_values_are_dropped() {
        for value in [json!(null), json!(true), json!([1, 2]), json!(""), json!("soon"), json!({})] {
            assert_eq!(TimestampLike::Raw(value.clone()).epoch_seconds(), None, "{value}");
        }
    }

    #[test]
    fn records_decode_from_documents() {
        let record = ObservationRecord::from_document(&json!({ "timestamp": { "seconds": 100 } }));
        assert_eq!(record.epoch_seconds_value(), Some(100));

        let missing = ObservationRecord::from_document(&json!({ "checkpoint": "finish" }));
        assert_eq!(missing, ObservationRecord::default());

        let null = ObservationRecord::from_document(&json!({ "timestamp": null }));
        assert_eq!(null.epoch_seconds_value(), None);
    }

    #[test]
    fn records_deserialize_permissively() {
        let record: ObservationRecord = serde_json::from_value(json!({ "timestamp": "garbage" })).unwrap();
        assert_eq!(record.epoch_seconds_value(), None);

        let record: ObservationRecord = serde_json::from_value(json!({})).unwrap();
        assert!(record.timestamp.is_none());
    }
}
