//! Incremental per-window per-key accumulator state.
//!
//! The table keeps one [`Accumulator`] per live (window, key) pair,
//! updated as records arrive and drained when the window closes. Memory
//! is O(open windows × distinct keys), not O(events) — which is why
//! prompt closing matters: a table whose windows are never drained grows
//! without bound under real traffic.
//!
//! Only the pipeline creates and updates entries; the lifecycle manager
//! drains them through [`AggregationTable::split_closeable`].

use std::collections::{BTreeMap, HashMap};

use crate::window::WindowId;

/// Default cap on distinct keys within a single window.
pub const DEFAULT_MAX_GROUPS_PER_WINDOW: usize = 1_000_000;

/// Per-(window, key) aggregate state: a count and the max event time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accumulator {
    count: u64,
    max_event_time_ms: i64,
}

impl Accumulator {
    /// Creates the accumulator for the first matching record.
    #[must_use]
    pub fn first(event_time_ms: i64) -> Self {
        Self {
            count: 1,
            max_event_time_ms: event_time_ms,
        }
    }

    /// Folds one more record into the accumulator.
    pub fn update(&mut self, event_time_ms: i64) {
        self.count += 1;
        self.max_event_time_ms = self.max_event_time_ms.max(event_time_ms);
    }

    /// Number of records folded in so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Maximum event time folded in so far, ms since epoch.
    #[must_use]
    pub fn max_event_time_ms(&self) -> i64 {
        self.max_event_time_ms
    }
}

/// Accumulator store for one feature.
///
/// Keyed by window first (`BTreeMap` ordered by window end) so the close
/// scan walks earliest-ending windows and stops at the first still-open
/// one; keys within a window are a plain map — insertion order is
/// irrelevant to the emitted result.
#[derive(Debug, Default)]
pub struct AggregationTable {
    windows: BTreeMap<WindowId, HashMap<String, Accumulator>>,
    max_groups_per_window: usize,
}

impl AggregationTable {
    /// Creates an empty table with the default group-cardinality cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_groups(DEFAULT_MAX_GROUPS_PER_WINDOW)
    }

    /// Creates an empty table with an explicit group-cardinality cap.
    #[must_use]
    pub fn with_max_groups(max_groups_per_window: usize) -> Self {
        Self {
            windows: BTreeMap::new(),
            max_groups_per_window,
        }
    }

    /// Creates or updates the accumulator for (window, key).
    ///
    /// First matching record creates `{count: 1, max_event_time}`; every
    /// later one increments the count and maxes the event time. New keys
    /// beyond the per-window cardinality cap are dropped with a warning.
    pub fn upsert(&mut self, window: WindowId, key: &str, event_time_ms: i64) {
        let groups = self.windows.entry(window).or_default();
        if let Some(acc) = groups.get_mut(key) {
            acc.update(event_time_ms);
        } else {
            if groups.len() >= self.max_groups_per_window {
                tracing::warn!(
                    max_groups = self.max_groups_per_window,
                    window_start = window.start_ms,
                    "per-window group cardinality limit reached, dropping new key"
                );
                return;
            }
            groups.insert(key.to_owned(), Accumulator::first(event_time_ms));
        }
    }

    /// Removes and returns the accumulator for (window, key).
    pub fn take(&mut self, window: WindowId, key: &str) -> Option<Accumulator> {
        let groups = self.windows.get_mut(&window)?;
        let acc = groups.remove(key);
        if groups.is_empty() {
            self.windows.remove(&window);
        }
        acc
    }

    /// Iterates the keys with a live accumulator in `window`.
    pub fn keys_for_window(&self, window: WindowId) -> impl Iterator<Item = &str> {
        self.windows
            .get(&window)
            .into_iter()
            .flat_map(|groups| groups.keys().map(String::as_str))
    }

    /// Removes and returns every window with `end <= watermark`, earliest
    /// ending first.
    pub fn split_closeable(
        &mut self,
        watermark_ms: i64,
    ) -> Vec<(WindowId, HashMap<String, Accumulator>)> {
        let to_close: Vec<WindowId> = self
            .windows
            .keys()
            .copied()
            .take_while(|w| w.end_ms <= watermark_ms)
            .collect();

        to_close
            .into_iter()
            .filter_map(|w| self.windows.remove(&w).map(|groups| (w, groups)))
            .collect()
    }

    /// Number of open windows.
    #[must_use]
    pub fn open_window_count(&self) -> usize {
        self.windows.len()
    }

    /// Total number of live (window, key) groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.windows.values().map(HashMap::len).sum()
    }
}
