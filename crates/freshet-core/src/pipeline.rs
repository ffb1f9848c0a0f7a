//! The aggregation pipeline: per-record orchestration.
//!
//! For each record: validate → observe the watermark → for every feature,
//! derive the dimension key, assign windows, drop-or-upsert against the
//! late-data policy → advance the lifecycle manager once. Emission is the
//! only externally observable effect and may trail the triggering record
//! by any number of windows — it is driven purely by watermark progress.

use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::feature::{EmittedRow, FeatureDef};
use crate::lifecycle::WindowLifecycleManager;
use crate::record::Record;
use crate::state::AggregationTable;
use crate::time::{BoundedLatenessTracker, Watermark};
use crate::window::WindowAssigner;

/// Everything one feature needs at runtime. The table exclusively owns
/// the accumulators; the lifecycle manager drains them on advance.
struct FeatureRuntime {
    def: Box<dyn FeatureDef>,
    assigner: Box<dyn WindowAssigner>,
    table: AggregationTable,
    lifecycle: WindowLifecycleManager,
}

/// Counters for the pipeline's non-fatal drop paths and output volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Records handed to [`AggregationPipeline::process`].
    pub records_seen: u64,
    /// Records dropped by validation.
    pub records_rejected: u64,
    /// Per-window drops of records whose target window had closed.
    pub late_drops: u64,
    /// Rows emitted across all features.
    pub rows_emitted: u64,
    /// Currently open windows across all features.
    pub open_windows: usize,
    /// Currently live (window, key) groups across all features.
    pub live_groups: usize,
}

/// Single-partition event-time aggregation pipeline.
///
/// All state is owned by this instance and processing is strictly
/// sequential: one call to [`process`](Self::process) completes atomically
/// with respect to the next. Parallel deployments run one pipeline per
/// disjoint key partition, each with its own watermark and tables.
pub struct AggregationPipeline {
    tracker: BoundedLatenessTracker,
    features: Vec<FeatureRuntime>,
    records_seen: u64,
    records_rejected: u64,
    late_drops: u64,
    rows_emitted: u64,
}

impl AggregationPipeline {
    /// Builds a pipeline for the given features.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] when a feature's window shape is
    /// invalid (zero size, slide larger than size, non-divisible slide).
    pub fn new(
        config: &EngineConfig,
        features: Vec<Box<dyn FeatureDef>>,
    ) -> Result<Self, CoreError> {
        let features = features
            .into_iter()
            .map(|def| {
                let assigner = def.window_kind().assigner()?;
                Ok(FeatureRuntime {
                    def,
                    assigner,
                    table: AggregationTable::with_max_groups(config.max_groups_per_window),
                    lifecycle: WindowLifecycleManager::new(),
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        Ok(Self {
            tracker: BoundedLatenessTracker::new(config.allowed_lateness),
            features,
            records_seen: 0,
            records_rejected: 0,
            late_drops: 0,
            rows_emitted: 0,
        })
    }

    /// Processes one record and returns the rows its watermark
    /// contribution caused to be emitted (possibly none, possibly many).
    pub fn process(&mut self, record: &Record) -> Vec<EmittedRow> {
        self.records_seen += 1;

        if let Err(err) = record.validate() {
            self.records_rejected += 1;
            tracing::debug!(msg_id = %record.msg_id, error = %err, "record rejected");
            return Vec::new();
        }

        let watermark = self.tracker.observe(record.create_time_ms);

        let mut rows = Vec::new();
        for feature in &mut self.features {
            if let Some(key) = feature.def.dimension_key(record) {
                for window in feature.assigner.assign_windows(record.create_time_ms) {
                    // Late-data policy: a window whose end the watermark
                    // has crossed is closed and never accepts records.
                    if window.end_ms <= watermark.timestamp_ms() {
                        self.late_drops += 1;
                        tracing::trace!(
                            msg_id = %record.msg_id,
                            feature_group = feature.def.group_name(),
                            window_end = window.end_ms,
                            watermark = watermark.timestamp_ms(),
                            "late record dropped for closed window"
                        );
                        continue;
                    }
                    feature.table.upsert(window, &key, record.create_time_ms);
                }
            }

            rows.extend(feature.lifecycle.advance(
                watermark,
                &mut feature.table,
                feature.def.group_name(),
                feature.def.dimension_field(),
            ));
        }

        self.rows_emitted += rows.len() as u64;
        rows
    }

    /// Current watermark, or `None` before the first record.
    #[must_use]
    pub fn watermark(&self) -> Option<Watermark> {
        self.tracker.current()
    }

    /// Snapshot of the pipeline counters and live state sizes.
    #[must_use]
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            records_seen: self.records_seen,
            records_rejected: self.records_rejected,
            late_drops: self.late_drops,
            rows_emitted: self.rows_emitted,
            open_windows: self
                .features
                .iter()
                .map(|f| f.table.open_window_count())
                .sum(),
            live_groups: self.features.iter().map(|f| f.table.group_count()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::window::WindowKind;

    /// 2025-06-01T00:00:00Z — a 10-minute-aligned absolute base so both
    /// enclosing hopping windows exist for every test timestamp.
    const BASE: i64 = 1_748_736_000_000;
    const MIN: i64 = 60_000;

    struct CountByLocation {
        kind: WindowKind,
        invalid_only: bool,
    }

    impl FeatureDef for CountByLocation {
        fn group_name(&self) -> &str {
            "count-by-location"
        }

        fn dimension_field(&self) -> &str {
            "location_code"
        }

        fn window_kind(&self) -> WindowKind {
            self.kind
        }

        fn dimension_key(&self, record: &Record) -> Option<String> {
            if self.invalid_only && record.response != "INVALID" {
                return None;
            }
            Some(record.location_code.clone())
        }
    }

    fn hopping_feature() -> Box<dyn FeatureDef> {
        Box::new(CountByLocation {
            kind: WindowKind::Hopping {
                size: Duration::from_secs(600),
                slide: Duration::from_secs(300),
            },
            invalid_only: false,
        })
    }

    fn tumbling_invalid_feature() -> Box<dyn FeatureDef> {
        Box::new(CountByLocation {
            kind: WindowKind::Tumbling {
                size: Duration::from_secs(300),
            },
            invalid_only: true,
        })
    }

    fn record(location: &str, response: &str, ts_ms: i64) -> Record {
        Record {
            msg_id: format!("m-{ts_ms}"),
            msg_type: "coupon".into(),
            device_id: "d-1".into(),
            location_code: location.into(),
            coupon_code: "COUPON1234".into(),
            response: response.into(),
            create_time_ms: ts_ms,
        }
    }

    #[test]
    fn test_count_correctness_single_window() {
        let mut pipeline =
            AggregationPipeline::new(&EngineConfig::default(), vec![tumbling_invalid_feature()])
                .unwrap();

        for i in 0..5 {
            let rows = pipeline.process(&record("A", "INVALID", BASE + i * MIN));
            assert!(rows.is_empty());
        }
        // Push the watermark past the tumble end (+ lateness).
        let rows = pipeline.process(&record("B", "INVALID", BASE + 5 * MIN + 5_000));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].dimension_key, "A");
        assert_eq!(rows[0].msg_count, 5);
        assert_eq!(rows[0].event_time_ms, BASE + 4 * MIN);
    }

    #[test]
    fn test_invalid_count_scenario() {
        // 3 INVALID + 1 VALID in one 5-minute tumble: the VALID record
        // must not affect the count.
        let mut pipeline =
            AggregationPipeline::new(&EngineConfig::default(), vec![tumbling_invalid_feature()])
                .unwrap();

        pipeline.process(&record("A", "INVALID", BASE + MIN));
        pipeline.process(&record("A", "VALID", BASE + 2 * MIN));
        pipeline.process(&record("A", "INVALID", BASE + 3 * MIN));
        pipeline.process(&record("A", "INVALID", BASE + 4 * MIN));

        let rows = pipeline.process(&record("B", "INVALID", BASE + 5 * MIN + 5_000));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].dimension_field, "location_code");
        assert_eq!(rows[0].dimension_key, "A");
        assert_eq!(rows[0].msg_count, 3);
    }

    #[test]
    fn test_hopping_record_lands_in_two_windows() {
        let mut pipeline =
            AggregationPipeline::new(&EngineConfig::default(), vec![hopping_feature()]).unwrap();

        pipeline.process(&record("A", "VALID", BASE + 2 * MIN));
        let stats = pipeline.stats();
        assert_eq!(stats.open_windows, 2);
        assert_eq!(stats.live_groups, 2);
    }

    #[test]
    fn test_hopping_scenario_two_rows_per_key() {
        // Two records at BASE+0 / BASE+2min: windows [BASE-5m, BASE+5m)
        // and [BASE, BASE+10m) each hold both.
        let mut pipeline =
            AggregationPipeline::new(&EngineConfig::default(), vec![hopping_feature()]).unwrap();

        pipeline.process(&record("A", "VALID", BASE));
        pipeline.process(&record("A", "VALID", BASE + 2 * MIN));

        // Advance watermark past BASE+10min: both windows close.
        let rows = pipeline.process(&record("Z", "VALID", BASE + 10 * MIN + 5_000));
        let a_rows: Vec<_> = rows.iter().filter(|r| r.dimension_key == "A").collect();
        assert_eq!(a_rows.len(), 2);
        assert!(a_rows.iter().all(|r| r.msg_count == 2));
        assert!(a_rows.iter().all(|r| r.event_time_ms == BASE + 2 * MIN));
    }

    #[test]
    fn test_late_record_does_not_alter_closed_window() {
        let mut pipeline =
            AggregationPipeline::new(&EngineConfig::default(), vec![tumbling_invalid_feature()])
                .unwrap();

        pipeline.process(&record("A", "INVALID", BASE + MIN));
        let rows = pipeline.process(&record("B", "INVALID", BASE + 5 * MIN + 5_000));
        assert_eq!(rows.len(), 1);

        // A straggler for the already-closed tumble: dropped, and no
        // future advance may surface it.
        let rows = pipeline.process(&record("A", "INVALID", BASE + 2 * MIN));
        assert!(rows.is_empty());
        assert_eq!(pipeline.stats().late_drops, 1);

        let rows = pipeline.process(&record("B", "INVALID", BASE + 20 * MIN));
        assert!(rows.iter().all(|r| r.dimension_key != "A"));
    }

    #[test]
    fn test_validation_rejects_and_counts() {
        let mut pipeline =
            AggregationPipeline::new(&EngineConfig::default(), vec![hopping_feature()]).unwrap();

        let rows = pipeline.process(&record("", "VALID", BASE));
        assert!(rows.is_empty());
        let stats = pipeline.stats();
        assert_eq!(stats.records_rejected, 1);
        assert_eq!(stats.open_windows, 0);
        // A rejected record must not advance the watermark either... it
        // never reaches the tracker.
        assert_eq!(pipeline.watermark(), None);
    }

    #[test]
    fn test_no_records_no_emission() {
        let mut pipeline =
            AggregationPipeline::new(&EngineConfig::default(), vec![hopping_feature()]).unwrap();
        assert_eq!(pipeline.watermark(), None);
        assert_eq!(pipeline.stats(), PipelineStats::default());
    }

    #[test]
    fn test_two_features_share_one_watermark() {
        let mut pipeline = AggregationPipeline::new(
            &EngineConfig::default(),
            vec![hopping_feature(), tumbling_invalid_feature()],
        )
        .unwrap();

        pipeline.process(&record("A", "INVALID", BASE + MIN));
        // One record advances the clock for both feature families.
        let rows = pipeline.process(&record("Z", "VALID", BASE + 10 * MIN + 5_000));

        let groups: Vec<&str> = rows.iter().map(|r| r.feature_group.as_str()).collect();
        assert!(groups.contains(&"count-by-location"));
        // Hopping windows [BASE-5m, BASE+5m) and [BASE, BASE+10m) closed
        // for "A"; tumble [BASE, BASE+5m) closed too.
        let a_rows = rows.iter().filter(|r| r.dimension_key == "A").count();
        assert_eq!(a_rows, 3);
    }

    #[test]
    fn test_invalid_window_config_is_an_error() {
        let bad = Box::new(CountByLocation {
            kind: WindowKind::Hopping {
                size: Duration::from_secs(600),
                slide: Duration::from_secs(420),
            },
            invalid_only: false,
        });
        assert!(AggregationPipeline::new(&EngineConfig::default(), vec![bad]).is_err());
    }
}
