//! # Freshet
//!
//! Embeddable streaming feature aggregation over event-time windows.
//!
//! A [`FeatureJob`] wires a record source through the aggregation
//! pipeline to a row sink: coupon-validation events stream in, and
//! per-key aggregate rows stream out whenever the watermark closes a
//! window. Two coupon-validation features ship built in; more plug in
//! via [`freshet_core::FeatureDef`].
//!
//! # Example
//!
//! ```rust,ignore
//! let (records, source) = channel_source(1024);
//! let (sink, mut rows) = channel_sink(1024);
//!
//! let (job, handle) = FeatureJob::builder()
//!     .allowed_lateness(Duration::from_secs(5))
//!     .source(Box::new(source))
//!     .sink(Box::new(sink))
//!     .build()?;
//!
//! tokio::spawn(job.run());
//! // feed `records`, read aggregate rows from `rows`, and
//! // `handle.shutdown()` when done.
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod builder;
pub mod config;
pub mod error;
pub mod features;
pub mod job;
mod sink_task;

pub use builder::FeatureJobBuilder;
pub use config::JobConfig;
pub use error::JobError;
pub use features::{CouponPrefixCount, LocationInvalidCount};
pub use job::{FeatureJob, JobHandle, JobReport};

pub use freshet_core::{
    AggregationPipeline, EmittedRow, EngineConfig, FeatureDef, PipelineStats, Record, WindowKind,
};
