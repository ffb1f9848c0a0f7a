//! The ingested record shape.

/// A single coupon-validation event.
///
/// `create_time_ms` is the event timestamp (ms since epoch); all other
/// fields are opaque strings used only for filtering and keying. Records
/// are immutable once ingested. Timestamp parsing happens at the connector
/// boundary — a `Record` always carries a usable event time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Unique message id.
    pub msg_id: String,
    /// Message type discriminator.
    pub msg_type: String,
    /// Originating device.
    pub device_id: String,
    /// Location the validation request came from.
    pub location_code: String,
    /// The coupon code being validated.
    pub coupon_code: String,
    /// Validation outcome (e.g. `"VALID"` / `"INVALID"`).
    pub response: String,
    /// Event timestamp, ms since epoch.
    pub create_time_ms: i64,
}

impl Record {
    /// Checks required fields.
    ///
    /// `location_code` is the one field every feature keys on; a record
    /// without it can never contribute to any aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.location_code.is_empty() {
            return Err(ValidationError::EmptyField {
                field: "location_code",
            });
        }
        Ok(())
    }
}

/// Reason a record failed ingest validation. Never fatal — the pipeline
/// counts and drops the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field was missing or empty.
    #[error("required field '{field}' is empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },
}
