//! Feature definitions and emitted rows.
//!
//! A feature is one continuously computed aggregate: a window shape plus a
//! rule for deriving the dimension key from a record (which doubles as the
//! feature's filter — records that derive no key don't participate).
//! Additional features plug in through [`FeatureDef`] without touching the
//! engine.

use crate::record::Record;
use crate::window::WindowKind;

/// One feature computed by the pipeline.
///
/// Implementations must be pure with respect to the record: the same
/// record always derives the same key. All per-window state is owned by
/// the engine, not the feature.
pub trait FeatureDef: Send {
    /// Feature group name stamped on every emitted row.
    fn group_name(&self) -> &str;

    /// Name of the dimension column in emitted rows
    /// (e.g. `"loc_coupon_prefix"`).
    fn dimension_field(&self) -> &str;

    /// Window shape this feature aggregates over.
    fn window_kind(&self) -> WindowKind;

    /// Derives the dimension key for a record, or `None` when the record
    /// is filtered out of this feature.
    fn dimension_key(&self, record: &Record) -> Option<String>;
}

/// One aggregate row handed to the sink when a window closes.
///
/// Mirrors the sink row shape `{feature_group_name, <dimension>,
/// msg_count, event_time}`; `event_time` is the maximum event time
/// observed within the (window, key) group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedRow {
    /// Feature group name.
    pub feature_group: String,
    /// Name of the dimension column.
    pub dimension_field: String,
    /// Dimension key value.
    pub dimension_key: String,
    /// Number of records aggregated into this row.
    pub msg_count: u64,
    /// Maximum event time within the group, ms since epoch.
    pub event_time_ms: i64,
}
