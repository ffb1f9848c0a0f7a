//! Built-in feature definitions.
//!
//! The two coupon-validation features shipped with the engine:
//!
//! - **coupon-prefix-count** — validation requests in the last 10
//!   minutes for the same coupon prefix from the same location, updated
//!   every 5 minutes (hopping window).
//! - **location-invalid-count** — invalid validation requests per
//!   location per 5 minutes (tumbling window).

use std::time::Duration;

use freshet_core::{EngineConfig, FeatureDef, Record, WindowKind};

/// Counts validation requests per `location#coupon-prefix` over a
/// hopping window.
///
/// The dimension key concatenates the location code and the coupon code
/// with its last 4 characters removed, separated by `#`. The prefix is
/// counted in characters, not bytes; coupons of 4 or fewer characters
/// yield an empty prefix (the key degenerates to `"<loc>#"`). Records
/// without a coupon code don't participate.
#[derive(Debug, Clone)]
pub struct CouponPrefixCount {
    size: Duration,
    slide: Duration,
}

impl CouponPrefixCount {
    /// Number of trailing characters stripped from the coupon code.
    const SUFFIX_LEN: usize = 4;

    /// Creates the feature with an explicit window shape.
    #[must_use]
    pub fn new(size: Duration, slide: Duration) -> Self {
        Self { size, slide }
    }

    /// Creates the feature with the configured hopping window.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.hopping_size, config.hopping_slide)
    }
}

impl FeatureDef for CouponPrefixCount {
    fn group_name(&self) -> &str {
        "proto-coupon-prefix-count"
    }

    fn dimension_field(&self) -> &str {
        "loc_coupon_prefix"
    }

    fn window_kind(&self) -> WindowKind {
        WindowKind::Hopping {
            size: self.size,
            slide: self.slide,
        }
    }

    fn dimension_key(&self, record: &Record) -> Option<String> {
        if record.coupon_code.is_empty() {
            return None;
        }
        let prefix = coupon_prefix(&record.coupon_code, Self::SUFFIX_LEN);
        Some(format!("{}#{prefix}", record.location_code))
    }
}

/// Counts `INVALID` validation responses per location over a tumbling
/// window.
#[derive(Debug, Clone)]
pub struct LocationInvalidCount {
    size: Duration,
}

impl LocationInvalidCount {
    /// Creates the feature with an explicit window size.
    #[must_use]
    pub fn new(size: Duration) -> Self {
        Self { size }
    }

    /// Creates the feature with the configured tumbling window.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.tumbling_size)
    }
}

impl FeatureDef for LocationInvalidCount {
    fn group_name(&self) -> &str {
        "proto-coupon-location-invalid-count"
    }

    fn dimension_field(&self) -> &str {
        "location_code"
    }

    fn window_kind(&self) -> WindowKind {
        WindowKind::Tumbling { size: self.size }
    }

    fn dimension_key(&self, record: &Record) -> Option<String> {
        (record.response == "INVALID").then(|| record.location_code.clone())
    }
}

/// The coupon code with its last `suffix_len` characters removed,
/// counted in characters.
fn coupon_prefix(coupon_code: &str, suffix_len: usize) -> &str {
    let chars = coupon_code.chars().count();
    let keep = chars.saturating_sub(suffix_len);
    coupon_code
        .char_indices()
        .nth(keep)
        .map_or(coupon_code, |(idx, _)| &coupon_code[..idx])
}
