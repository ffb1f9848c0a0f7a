//! # Time Module
//!
//! Event-time tracking and watermarks.
//!
//! ## Concepts
//!
//! - **Event time**: timestamp carried by the record itself
//! - **Watermark**: assertion that no record with a smaller event time
//!   will be accepted from here on
//!
//! The tracker is the engine's only clock. Window assignment and window
//! closing both work in the same millisecond event-time domain, so the
//! two can never disagree about whether a window is still open.

use std::time::Duration;

/// A watermark indicating event-time progress, in milliseconds since epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Watermark(pub i64);

impl Watermark {
    /// Creates a new watermark.
    #[must_use]
    pub fn new(timestamp_ms: i64) -> Self {
        Self(timestamp_ms)
    }

    /// Gets the watermark timestamp in milliseconds.
    #[must_use]
    pub fn timestamp_ms(&self) -> i64 {
        self.0
    }

    /// Checks if an event time is late relative to this watermark.
    #[must_use]
    pub fn is_late(&self, event_time_ms: i64) -> bool {
        event_time_ms < self.0
    }
}

/// Watermark tracker with bounded out-of-order tolerance.
///
/// Maintains the maximum event time observed so far and reports the
/// watermark as `max_seen - allowed_lateness`. The reported value is
/// monotone non-decreasing even when records arrive out of order.
///
/// One tracker exists per pipeline instance (per partition), not per key.
/// Under extreme key skew a hot key can therefore advance the watermark
/// past a cold key's windows; this matches Flink's bounded-out-of-orderness
/// strategy that the engine models.
#[derive(Debug, Clone)]
pub struct BoundedLatenessTracker {
    allowed_lateness_ms: i64,
    max_seen_ms: Option<i64>,
}

impl BoundedLatenessTracker {
    /// Creates a tracker tolerating events at most `allowed_lateness` late.
    ///
    /// # Panics
    ///
    /// Panics if `allowed_lateness` does not fit in `i64` milliseconds.
    #[must_use]
    pub fn new(allowed_lateness: Duration) -> Self {
        let allowed_lateness_ms =
            i64::try_from(allowed_lateness.as_millis()).expect("lateness must fit in i64");
        Self {
            allowed_lateness_ms,
            max_seen_ms: None,
        }
    }

    /// Observes an event timestamp and returns the current watermark.
    ///
    /// The returned watermark never decreases, even if `event_time_ms` is
    /// smaller than a previously observed timestamp.
    pub fn observe(&mut self, event_time_ms: i64) -> Watermark {
        let max_seen = match self.max_seen_ms {
            Some(seen) => seen.max(event_time_ms),
            None => event_time_ms,
        };
        self.max_seen_ms = Some(max_seen);
        Watermark::new(max_seen.saturating_sub(self.allowed_lateness_ms))
    }

    /// Returns the current watermark, or `None` before the first record.
    #[must_use]
    pub fn current(&self) -> Option<Watermark> {
        self.max_seen_ms
            .map(|seen| Watermark::new(seen.saturating_sub(self.allowed_lateness_ms)))
    }
}
