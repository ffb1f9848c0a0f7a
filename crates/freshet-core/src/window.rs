//! Window identity and assignment.
//!
//! A window is a half-open event-time interval `[start, end)`. Assigners
//! map an event timestamp to the set of windows it belongs to:
//!
//! - **Tumbling**: fixed size, non-overlapping — exactly one window.
//! - **Hopping**: fixed size, advanced by a slide smaller than the size —
//!   every slide-aligned window containing the timestamp. With
//!   `size = 2 * slide` each timestamp lands in exactly 2 windows.
//!
//! Assignment is a pure function of the timestamp. It uses the same
//! millisecond event-time domain as the watermark tracker so assignment
//! and closing decisions never disagree.

use std::cmp::Ordering;
use std::time::Duration;

use smallvec::SmallVec;

use crate::error::CoreError;

/// Identity of a single window: `[start_ms, end_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId {
    /// Inclusive window start, ms since epoch.
    pub start_ms: i64,
    /// Exclusive window end, ms since epoch.
    pub end_ms: i64,
}

impl WindowId {
    /// Creates a new window identity.
    #[must_use]
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Whether `timestamp_ms` falls inside `[start, end)`.
    #[must_use]
    pub fn contains(&self, timestamp_ms: i64) -> bool {
        self.start_ms <= timestamp_ms && timestamp_ms < self.end_ms
    }
}

// Ordered by (end, start): closing scans walk earliest-ending windows first.
impl Ord for WindowId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.end_ms, self.start_ms).cmp(&(other.end_ms, other.start_ms))
    }
}

impl PartialOrd for WindowId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Window set returned by assignment. Inline for the common 1–2 windows.
pub type WindowIdVec = SmallVec<[WindowId; 2]>;

/// Maps an event timestamp to the set of windows it belongs to.
pub trait WindowAssigner: Send {
    /// Returns every window whose interval contains `timestamp_ms`.
    fn assign_windows(&self, timestamp_ms: i64) -> WindowIdVec;
}

/// Tumbling window assigner: fixed-size, non-overlapping buckets.
#[derive(Debug, Clone)]
pub struct TumblingWindowAssigner {
    size_ms: i64,
}

impl TumblingWindowAssigner {
    /// Creates a new tumbling assigner.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero or does not fit in `i64` milliseconds.
    #[must_use]
    pub fn new(size: Duration) -> Self {
        let size_ms = i64::try_from(size.as_millis()).expect("size must fit in i64");
        Self::from_millis(size_ms)
    }

    /// Creates a new tumbling assigner with a millisecond size.
    ///
    /// # Panics
    ///
    /// Panics if `size_ms` is zero or negative.
    #[must_use]
    pub fn from_millis(size_ms: i64) -> Self {
        assert!(size_ms > 0, "Size must be positive");
        Self { size_ms }
    }

    /// Returns the window size in milliseconds.
    #[must_use]
    pub fn size_ms(&self) -> i64 {
        self.size_ms
    }
}

impl WindowAssigner for TumblingWindowAssigner {
    fn assign_windows(&self, timestamp_ms: i64) -> WindowIdVec {
        let start = timestamp_ms.div_euclid(self.size_ms) * self.size_ms;
        let mut windows = WindowIdVec::new();
        windows.push(WindowId::new(start, start + self.size_ms));
        windows
    }
}

/// Hopping window assigner: overlapping windows advanced by a slide.
///
/// # Invariants
///
/// - `slide > 0`
/// - `size > 0`
/// - `slide <= size`
/// - `size % slide == 0`
#[derive(Debug, Clone)]
pub struct HoppingWindowAssigner {
    size_ms: i64,
    slide_ms: i64,
}

impl HoppingWindowAssigner {
    /// Creates a new hopping assigner.
    ///
    /// # Panics
    ///
    /// Panics if slide or size is zero, slide > size, or size is not
    /// evenly divisible by slide.
    #[must_use]
    pub fn new(size: Duration, slide: Duration) -> Self {
        let size_ms = i64::try_from(size.as_millis()).expect("size must fit in i64");
        let slide_ms = i64::try_from(slide.as_millis()).expect("slide must fit in i64");
        Self::from_millis(size_ms, slide_ms)
    }

    /// Creates a new hopping assigner with millisecond values.
    ///
    /// # Panics
    ///
    /// Panics if slide or size is zero/negative, slide > size, or size
    /// is not evenly divisible by slide.
    #[must_use]
    pub fn from_millis(size_ms: i64, slide_ms: i64) -> Self {
        assert!(slide_ms > 0, "Slide must be positive");
        assert!(size_ms > 0, "Size must be positive");
        assert!(slide_ms <= size_ms, "Slide must not exceed size");
        assert!(
            size_ms % slide_ms == 0,
            "Size must be evenly divisible by slide"
        );
        Self { size_ms, slide_ms }
    }

    /// Returns the window size in milliseconds.
    #[must_use]
    pub fn size_ms(&self) -> i64 {
        self.size_ms
    }

    /// Returns the slide in milliseconds.
    #[must_use]
    pub fn slide_ms(&self) -> i64 {
        self.slide_ms
    }
}

impl WindowAssigner for HoppingWindowAssigner {
    fn assign_windows(&self, timestamp_ms: i64) -> WindowIdVec {
        // The last slide-aligned start at or before the timestamp, then
        // walk backwards while the window still covers it. Starts below
        // the epoch origin are clipped.
        let last_start = timestamp_ms.div_euclid(self.slide_ms) * self.slide_ms;
        let mut windows = WindowIdVec::new();
        let mut start = last_start;
        while start + self.size_ms > timestamp_ms {
            windows.push(WindowId::new(start, start + self.size_ms));
            start -= self.slide_ms;
            if start < 0 {
                break;
            }
        }
        windows
    }
}

/// Window shape for a feature, settable from external configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// Overlapping windows of `size`, advanced by `slide`.
    Hopping {
        /// Window size.
        size: Duration,
        /// Slide between consecutive window starts.
        slide: Duration,
    },
    /// Non-overlapping windows of `size`.
    Tumbling {
        /// Window size.
        size: Duration,
    },
}

impl WindowKind {
    /// Builds the assigner for this window shape.
    ///
    /// Unlike the assigner constructors, this validates instead of
    /// panicking: the values come from external configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] when sizes are zero, the slide
    /// exceeds the size, or the size is not a multiple of the slide.
    pub fn assigner(&self) -> Result<Box<dyn WindowAssigner>, CoreError> {
        match *self {
            WindowKind::Hopping { size, slide } => {
                let size_ms = duration_ms(size, "hopping window size")?;
                let slide_ms = duration_ms(slide, "hopping window slide")?;
                if slide_ms > size_ms {
                    return Err(CoreError::Config(format!(
                        "hopping slide {slide_ms}ms exceeds size {size_ms}ms"
                    )));
                }
                if size_ms % slide_ms != 0 {
                    return Err(CoreError::Config(format!(
                        "hopping size {size_ms}ms is not a multiple of slide {slide_ms}ms"
                    )));
                }
                Ok(Box::new(HoppingWindowAssigner::from_millis(
                    size_ms, slide_ms,
                )))
            }
            WindowKind::Tumbling { size } => {
                let size_ms = duration_ms(size, "tumbling window size")?;
                Ok(Box::new(TumblingWindowAssigner::from_millis(size_ms)))
            }
        }
    }
}

fn duration_ms(d: Duration, what: &str) -> Result<i64, CoreError> {
    let ms = i64::try_from(d.as_millis())
        .map_err(|_| CoreError::Config(format!("{what} overflows i64 milliseconds")))?;
    if ms <= 0 {
        return Err(CoreError::Config(format!("{what} must be positive")));
    }
    Ok(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: i64 = 60_000;

    #[test]
    fn test_window_contains_half_open() {
        let w = WindowId::new(0, 10 * MIN);
        assert!(w.contains(0));
        assert!(w.contains(10 * MIN - 1));
        assert!(!w.contains(10 * MIN));
        assert!(!w.contains(-1));
    }

    #[test]
    fn test_window_order_by_end() {
        let early = WindowId::new(5 * MIN, 10 * MIN);
        let late = WindowId::new(0, 15 * MIN);
        assert!(early < late);
    }

    #[test]
    fn test_tumbling_single_window() {
        let assigner = TumblingWindowAssigner::new(Duration::from_secs(300));
        let windows = assigner.assign_windows(7 * MIN);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0], WindowId::new(5 * MIN, 10 * MIN));
    }

    #[test]
    fn test_tumbling_boundary_starts_next_window() {
        let assigner = TumblingWindowAssigner::new(Duration::from_secs(300));
        let windows = assigner.assign_windows(5 * MIN);
        assert_eq!(windows[0], WindowId::new(5 * MIN, 10 * MIN));
    }

    #[test]
    fn test_tumbling_negative_timestamp_aligns_down() {
        let assigner = TumblingWindowAssigner::from_millis(5 * MIN);
        let windows = assigner.assign_windows(-1);
        assert_eq!(windows[0], WindowId::new(-5 * MIN, 0));
    }

    #[test]
    fn test_hopping_two_windows_per_timestamp() {
        // size=10min, slide=5min: every timestamp past the first slide
        // interval belongs to exactly 2 windows.
        let assigner =
            HoppingWindowAssigner::new(Duration::from_secs(600), Duration::from_secs(300));
        let windows = assigner.assign_windows(12 * MIN);
        assert_eq!(windows.len(), 2);
        assert!(windows.contains(&WindowId::new(10 * MIN, 20 * MIN)));
        assert!(windows.contains(&WindowId::new(5 * MIN, 15 * MIN)));
    }

    #[test]
    fn test_hopping_slide_boundary() {
        let assigner =
            HoppingWindowAssigner::new(Duration::from_secs(600), Duration::from_secs(300));
        let windows = assigner.assign_windows(10 * MIN);
        assert_eq!(windows.len(), 2);
        assert!(windows.contains(&WindowId::new(10 * MIN, 20 * MIN)));
        assert!(windows.contains(&WindowId::new(5 * MIN, 15 * MIN)));
    }

    #[test]
    fn test_hopping_clips_at_epoch_origin() {
        let assigner =
            HoppingWindowAssigner::new(Duration::from_secs(600), Duration::from_secs(300));
        // Within the first slide interval only the origin window exists.
        let windows = assigner.assign_windows(2 * MIN);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0], WindowId::new(0, 10 * MIN));
    }

    #[test]
    fn test_hopping_slide_equals_size_is_tumbling() {
        let assigner =
            HoppingWindowAssigner::new(Duration::from_secs(300), Duration::from_secs(300));
        let windows = assigner.assign_windows(7 * MIN);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0], WindowId::new(5 * MIN, 10 * MIN));
    }

    #[test]
    #[should_panic(expected = "Slide must be positive")]
    fn test_hopping_zero_slide_panics() {
        let _ = HoppingWindowAssigner::from_millis(10 * MIN, 0);
    }

    #[test]
    #[should_panic(expected = "evenly divisible")]
    fn test_hopping_not_divisible_panics() {
        let _ = HoppingWindowAssigner::from_millis(10 * MIN, 4 * MIN);
    }

    #[test]
    fn test_kind_validates_instead_of_panicking() {
        let bad = WindowKind::Hopping {
            size: Duration::from_secs(600),
            slide: Duration::from_secs(240),
        };
        assert!(bad.assigner().is_err());

        let zero = WindowKind::Tumbling {
            size: Duration::ZERO,
        };
        assert!(zero.assigner().is_err());
    }

    #[test]
    fn test_kind_builds_working_assigner() {
        let kind = WindowKind::Hopping {
            size: Duration::from_secs(600),
            slide: Duration::from_secs(300),
        };
        let assigner = kind.assigner().unwrap();
        assert_eq!(assigner.assign_windows(12 * MIN).len(), 2);
    }
}
