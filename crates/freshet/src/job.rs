//! The feature job: source → pipeline → sink run loop.
//!
//! Single-partition sequential model: one task polls the source, runs
//! the whole per-record algorithm, and forwards emitted rows to the sink
//! task. Nothing inside the loop blocks except the source read and the
//! (backpressured) sink hand-off.

use tokio::sync::watch;
use tracing::{debug, info};

use freshet_connectors::{RecordSource, RowSink, SourcePoll};
use freshet_core::{AggregationPipeline, PipelineStats};

use crate::error::JobError;
use crate::sink_task::SinkTaskHandle;

/// Shutdown controller for a running [`FeatureJob`].
///
/// Shutdown is clean but not draining: windows that are not yet
/// closeable are discarded un-emitted. Upstream replays the source from
/// its last committed offset, so discarded state is rebuilt on restart
/// rather than checkpointed here.
#[derive(Debug)]
pub struct JobHandle {
    tx: watch::Sender<bool>,
}

impl JobHandle {
    /// Signals the job to stop after the in-flight record.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Final accounting returned by [`FeatureJob::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobReport {
    /// Pipeline counters at shutdown.
    pub stats: PipelineStats,
    /// Whether the job stopped on a shutdown signal (vs. source
    /// exhaustion).
    pub interrupted: bool,
}

/// A wired feature job, ready to run.
pub struct FeatureJob {
    pub(crate) pipeline: AggregationPipeline,
    pub(crate) source: Box<dyn RecordSource>,
    pub(crate) sink: Box<dyn RowSink>,
    pub(crate) sink_buffer: usize,
    pub(crate) shutdown_rx: watch::Receiver<bool>,
}

impl std::fmt::Debug for FeatureJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureJob")
            .field("sink_buffer", &self.sink_buffer)
            .finish_non_exhaustive()
    }
}

impl FeatureJob {
    /// Starts building a job.
    #[must_use]
    pub fn builder() -> crate::builder::FeatureJobBuilder {
        crate::builder::FeatureJobBuilder::new()
    }

    pub(crate) fn shutdown_pair() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    pub(crate) fn handle(tx: watch::Sender<bool>) -> JobHandle {
        JobHandle { tx }
    }

    /// Runs the job until the source is exhausted or shutdown is
    /// signalled.
    ///
    /// # Errors
    ///
    /// Returns [`JobError`] when the source fails or the sink task dies;
    /// the surrounding process is expected to fail fast on either.
    pub async fn run(mut self) -> Result<JobReport, JobError> {
        self.source.open().await?;
        self.sink.open().await?;
        let sink = SinkTaskHandle::spawn(self.sink, self.sink_buffer);
        info!("feature job started");

        let mut shutdown_alive = true;
        let mut interrupted = false;
        loop {
            tokio::select! {
                changed = self.shutdown_rx.changed(), if shutdown_alive => {
                    match changed {
                        Ok(()) if *self.shutdown_rx.borrow() => {
                            interrupted = true;
                            break;
                        }
                        Ok(()) => {}
                        // Handle dropped: the job just runs to source
                        // exhaustion.
                        Err(_) => shutdown_alive = false,
                    }
                }
                polled = self.source.poll() => {
                    match polled? {
                        SourcePoll::Record(record) => {
                            let rows = self.pipeline.process(&record);
                            if !rows.is_empty() {
                                debug!(rows = rows.len(), "windows closed");
                            }
                            for row in rows {
                                sink.write_row(row).await?;
                            }
                        }
                        SourcePoll::Idle => {}
                        SourcePoll::Closed => break,
                    }
                }
            }
        }

        self.source.close().await?;
        sink.close().await?;

        let stats = self.pipeline.stats();
        info!(
            records_seen = stats.records_seen,
            records_rejected = stats.records_rejected,
            late_drops = stats.late_drops,
            rows_emitted = stats.rows_emitted,
            open_windows_discarded = stats.open_windows,
            interrupted,
            "feature job stopped"
        );
        Ok(JobReport { stats, interrupted })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use freshet_connectors::{channel_sink, channel_source};
    use freshet_core::Record;

    use super::*;
    use crate::builder::FeatureJobBuilder;

    /// 2025-06-01T00:00:00Z, 10-minute aligned.
    const BASE: i64 = 1_748_736_000_000;
    const MIN: i64 = 60_000;

    fn record(location: &str, coupon: &str, response: &str, ts_ms: i64) -> Record {
        Record {
            msg_id: format!("m-{ts_ms}"),
            msg_type: "coupon".into(),
            device_id: "d-1".into(),
            location_code: location.into(),
            coupon_code: coupon.into(),
            response: response.into(),
            create_time_ms: ts_ms,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_both_features() {
        let (records, source) = channel_source(64);
        let (sink, mut rows) = channel_sink(64);

        let (job, _handle) = FeatureJobBuilder::new()
            .source(Box::new(source))
            .sink(Box::new(sink))
            .build()
            .unwrap();
        let job = tokio::spawn(job.run());

        // Two prefix-sharing coupons from location A, one INVALID.
        records
            .send(record("A", "COUPON1234", "INVALID", BASE))
            .await
            .unwrap();
        records
            .send(record("A", "COUPON5678", "VALID", BASE + 2 * MIN))
            .await
            .unwrap();
        // Advance the watermark far past every open window, then end
        // the stream.
        records
            .send(record("Z", "OTHER00000", "VALID", BASE + 30 * MIN))
            .await
            .unwrap();
        drop(records);

        let report = job.await.unwrap().unwrap();
        assert_eq!(report.stats.records_seen, 3);
        assert!(!report.interrupted);

        let mut emitted = Vec::new();
        while let Some(row) = rows.recv().await {
            emitted.push(row);
        }

        // Hopping prefix-count: key A#COUPON in both enclosing windows.
        let prefix_rows: Vec<_> = emitted
            .iter()
            .filter(|r| r.feature_group == "proto-coupon-prefix-count")
            .filter(|r| r.dimension_key == "A#COUPON")
            .collect();
        assert_eq!(prefix_rows.len(), 2);
        assert!(prefix_rows.iter().all(|r| r.msg_count == 2));
        assert!(prefix_rows.iter().all(|r| r.event_time_ms == BASE + 2 * MIN));

        // Tumbling invalid-count: only the INVALID record counts.
        let invalid_rows: Vec<_> = emitted
            .iter()
            .filter(|r| r.feature_group == "proto-coupon-location-invalid-count")
            .collect();
        assert_eq!(invalid_rows.len(), 1);
        assert_eq!(invalid_rows[0].dimension_key, "A");
        assert_eq!(invalid_rows[0].msg_count, 1);
    }

    #[tokio::test]
    async fn test_shutdown_discards_open_windows() {
        let (records, source) = channel_source(64);
        let (sink, mut rows) = channel_sink(64);

        let (job, handle) = FeatureJobBuilder::new()
            .source(Box::new(source))
            .sink(Box::new(sink))
            .build()
            .unwrap();
        let job = tokio::spawn(job.run());

        records
            .send(record("A", "COUPON1234", "INVALID", BASE))
            .await
            .unwrap();
        // Give the loop a chance to ingest before signalling.
        tokio::task::yield_now().await;
        handle.shutdown();

        let report = job.await.unwrap().unwrap();
        assert!(report.interrupted);
        assert_eq!(report.stats.rows_emitted, 0);
        // Open windows were discarded, not flushed.
        assert!(rows.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_no_records_no_emissions() {
        let (records, source) = channel_source(8);
        let (sink, mut rows) = channel_sink(8);

        let (job, _handle) = FeatureJobBuilder::new()
            .tumbling_window(Duration::from_secs(300))
            .source(Box::new(source))
            .sink(Box::new(sink))
            .build()
            .unwrap();
        let job = tokio::spawn(job.run());
        drop(records);

        let report = job.await.unwrap().unwrap();
        assert_eq!(report.stats.records_seen, 0);
        assert!(rows.recv().await.is_none());
    }
}
