//! Window lifecycle: Open → Closeable → Closed.
//!
//! A window opens on its first record, becomes closeable once the
//! watermark crosses its end, and is closed — emitted and purged — on the
//! next lifecycle advance. Closed windows are terminal: their state is
//! gone from the table and the pipeline's late-drop check keeps them from
//! ever being re-created, so re-advancing the watermark can never re-emit.

use crate::feature::EmittedRow;
use crate::state::AggregationTable;
use crate::time::Watermark;

/// Decides, on each watermark advance, which windows fire and purge.
#[derive(Debug)]
pub struct WindowLifecycleManager {
    /// Highest window end closed so far. Windows at or below this end
    /// must never be offered for closing again.
    closed_frontier_ms: i64,
}

impl Default for WindowLifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowLifecycleManager {
    /// Creates a lifecycle manager with no closed windows yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            closed_frontier_ms: i64::MIN,
        }
    }

    /// Closes every window with `end <= watermark`, emitting one row per
    /// live (window, key) and purging the window from the table.
    ///
    /// Windows close in ascending end order; key order within a window is
    /// not part of the contract.
    ///
    /// # Panics
    ///
    /// Debug-asserts that no window at or below the closed frontier is
    /// seen again — that would mean a closed window re-accumulated state,
    /// which is corrupted state, not bad input.
    pub fn advance(
        &mut self,
        watermark: Watermark,
        table: &mut AggregationTable,
        feature_group: &str,
        dimension_field: &str,
    ) -> Vec<EmittedRow> {
        let closed = table.split_closeable(watermark.timestamp_ms());
        if closed.is_empty() {
            return Vec::new();
        }

        let mut rows = Vec::new();
        for (window, groups) in closed {
            debug_assert!(
                window.end_ms > self.closed_frontier_ms,
                "window [{}, {}) closed twice",
                window.start_ms,
                window.end_ms
            );
            self.closed_frontier_ms = window.end_ms;

            tracing::debug!(
                feature_group,
                window_start = window.start_ms,
                window_end = window.end_ms,
                groups = groups.len(),
                "closing window"
            );

            for (key, acc) in groups {
                rows.push(EmittedRow {
                    feature_group: feature_group.to_owned(),
                    dimension_field: dimension_field.to_owned(),
                    dimension_key: key,
                    msg_count: acc.count(),
                    event_time_ms: acc.max_event_time_ms(),
                });
            }
        }
        rows
    }

    /// Highest window end closed so far, or `None` before the first close.
    #[must_use]
    pub fn closed_frontier_ms(&self) -> Option<i64> {
        (self.closed_frontier_ms != i64::MIN).then_some(self.closed_frontier_ms)
    }
}
