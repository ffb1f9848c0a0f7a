//! JSON record codec.
//!
//! Decoding follows the upstream source contract: missing non-timestamp
//! fields become empty strings, while a missing or
//! unparsable `create_time` fails the record — the event timestamp is the
//! one field the engine cannot work without. [`RecordDecoder::decode_lossy`]
//! counts and skips failures instead of propagating them, so one bad
//! payload never stalls the stream.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::Deserialize;

use freshet_core::{EmittedRow, Record};

/// Timestamp patterns tried after RFC 3339 auto-detection, in order.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Why a payload failed to decode. Counted, never fatal.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Payload was not valid JSON for the record shape.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload had no `create_time` field.
    #[error("missing create_time")]
    MissingTimestamp,

    /// `create_time` did not match any accepted format.
    #[error("unparsable create_time: {0:?}")]
    BadTimestamp(String),
}

/// Wire shape of an incoming record; every field may be absent.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    msg_id: Option<String>,
    #[serde(default)]
    msg_type: Option<String>,
    #[serde(default)]
    device_id: Option<String>,
    #[serde(default)]
    location_code: Option<String>,
    #[serde(default)]
    coupon_code: Option<String>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    create_time: Option<String>,
}

/// Decodes JSON payloads into [`Record`]s.
#[derive(Debug, Default)]
pub struct RecordDecoder {
    failed: u64,
}

impl RecordDecoder {
    /// Creates a decoder with a zeroed failure counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] on malformed JSON or a missing/unparsable
    /// `create_time`.
    pub fn decode(&self, payload: &[u8]) -> Result<Record, DecodeError> {
        let raw: RawRecord = serde_json::from_slice(payload)?;
        let create_time = raw.create_time.ok_or(DecodeError::MissingTimestamp)?;
        let create_time_ms = parse_timestamp_ms(&create_time)
            .ok_or_else(|| DecodeError::BadTimestamp(create_time))?;

        Ok(Record {
            msg_id: raw.msg_id.unwrap_or_default(),
            msg_type: raw.msg_type.unwrap_or_default(),
            device_id: raw.device_id.unwrap_or_default(),
            location_code: raw.location_code.unwrap_or_default(),
            coupon_code: raw.coupon_code.unwrap_or_default(),
            response: raw.response.unwrap_or_default(),
            create_time_ms,
        })
    }

    /// Decodes one payload, counting and skipping failures.
    pub fn decode_lossy(&mut self, payload: &[u8]) -> Option<Record> {
        match self.decode(payload) {
            Ok(record) => Some(record),
            Err(err) => {
                self.failed += 1;
                tracing::debug!(error = %err, "skipping undecodable record");
                None
            }
        }
    }

    /// Number of payloads skipped by [`decode_lossy`](Self::decode_lossy).
    #[must_use]
    pub fn failed_count(&self) -> u64 {
        self.failed
    }
}

/// Parses an ISO-8601 / RFC 3339 timestamp to ms since epoch.
/// Zone-less forms are read as UTC.
fn parse_timestamp_ms(value: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc).timestamp_millis());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    None
}

/// Encodes [`EmittedRow`]s as JSON objects matching the sink tables:
/// `{feature_group_name, <dimension_field>, msg_count, event_time}` with
/// an ISO-8601 `event_time`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RowEncoder;

impl RowEncoder {
    /// Creates an encoder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Encodes one row.
    #[must_use]
    pub fn encode(&self, row: &EmittedRow) -> Vec<u8> {
        let mut object = serde_json::Map::new();
        object.insert(
            "feature_group_name".to_string(),
            serde_json::Value::from(row.feature_group.clone()),
        );
        object.insert(
            row.dimension_field.clone(),
            serde_json::Value::from(row.dimension_key.clone()),
        );
        object.insert(
            "msg_count".to_string(),
            serde_json::Value::from(row.msg_count),
        );
        object.insert(
            "event_time".to_string(),
            serde_json::Value::from(format_timestamp_ms(row.event_time_ms)),
        );
        serde_json::Value::Object(object).to_string().into_bytes()
    }
}

/// Formats ms since epoch as ISO-8601 with millisecond precision, UTC.
fn format_timestamp_ms(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map_or_else(
            || timestamp_ms.to_string(),
            |dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
}
