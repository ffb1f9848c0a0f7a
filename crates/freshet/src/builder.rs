//! Fluent builder for [`FeatureJob`] construction.

use std::time::Duration;

use freshet_connectors::{RecordSource, RowSink};
use freshet_core::{AggregationPipeline, FeatureDef};

use crate::config::JobConfig;
use crate::error::JobError;
use crate::features::{CouponPrefixCount, LocationInvalidCount};
use crate::job::{FeatureJob, JobHandle};

/// Fluent builder for a [`FeatureJob`].
///
/// # Example
///
/// ```rust,ignore
/// let (job, handle) = FeatureJob::builder()
///     .hopping_window(Duration::from_secs(600), Duration::from_secs(300))
///     .allowed_lateness(Duration::from_secs(5))
///     .source(Box::new(source))
///     .sink(Box::new(sink))
///     .build()?;
/// ```
pub struct FeatureJobBuilder {
    config: JobConfig,
    features: Vec<Box<dyn FeatureDef>>,
    source: Option<Box<dyn RecordSource>>,
    sink: Option<Box<dyn RowSink>>,
}

impl FeatureJobBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: JobConfig::default(),
            features: Vec::new(),
            source: None,
            sink: None,
        }
    }

    /// Sets the hopping window size and slide for the built-in
    /// prefix-count feature.
    #[must_use]
    pub fn hopping_window(mut self, size: Duration, slide: Duration) -> Self {
        self.config.engine.hopping_size = size;
        self.config.engine.hopping_slide = slide;
        self
    }

    /// Sets the tumbling window size for the built-in invalid-count
    /// feature.
    #[must_use]
    pub fn tumbling_window(mut self, size: Duration) -> Self {
        self.config.engine.tumbling_size = size;
        self
    }

    /// Sets the bounded out-of-order tolerance.
    #[must_use]
    pub fn allowed_lateness(mut self, lateness: Duration) -> Self {
        self.config.engine.allowed_lateness = lateness;
        self
    }

    /// Sets the per-window group cardinality cap.
    #[must_use]
    pub fn max_groups_per_window(mut self, max_groups: usize) -> Self {
        self.config.engine.max_groups_per_window = max_groups;
        self
    }

    /// Sets the sink command channel capacity.
    #[must_use]
    pub fn sink_buffer(mut self, capacity: usize) -> Self {
        self.config.sink_buffer = capacity;
        self
    }

    /// Registers a feature. When no feature is registered, `build()`
    /// installs the two built-in coupon features.
    #[must_use]
    pub fn feature(mut self, feature: Box<dyn FeatureDef>) -> Self {
        self.features.push(feature);
        self
    }

    /// Sets the record source.
    #[must_use]
    pub fn source(mut self, source: Box<dyn RecordSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the row sink.
    #[must_use]
    pub fn sink(mut self, sink: Box<dyn RowSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Builds the job and its shutdown handle.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::MissingSource`] / [`JobError::MissingSink`]
    /// when a collaborator is absent, or a config error when a feature's
    /// window shape is invalid.
    pub fn build(mut self) -> Result<(FeatureJob, JobHandle), JobError> {
        let source = self.source.ok_or(JobError::MissingSource)?;
        let sink = self.sink.ok_or(JobError::MissingSink)?;

        if self.features.is_empty() {
            self.features.push(Box::new(CouponPrefixCount::from_config(
                &self.config.engine,
            )));
            self.features.push(Box::new(LocationInvalidCount::from_config(
                &self.config.engine,
            )));
        }

        let pipeline = AggregationPipeline::new(&self.config.engine, self.features)?;
        let (tx, rx) = FeatureJob::shutdown_pair();

        let job = FeatureJob {
            pipeline,
            source,
            sink,
            sink_buffer: self.config.sink_buffer,
            shutdown_rx: rx,
        };
        Ok((job, FeatureJob::handle(tx)))
    }
}

impl Default for FeatureJobBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FeatureJobBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureJobBuilder")
            .field("config", &self.config)
            .field("features", &self.features.len())
            .field("has_source", &self.source.is_some())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}
