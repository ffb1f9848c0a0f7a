//! # Freshet Core
//!
//! Event-time windowed aggregation engine.
//!
//! The engine turns a stream of timestamped records into continuously
//! updated aggregate rows over hopping and tumbling event-time windows,
//! keyed by record attributes, with bounded out-of-order tolerance.
//!
//! ## Architecture
//!
//! ```text
//! record → validate → observe watermark → per feature:
//!            derive key → assign windows → upsert accumulators
//!                                              ↕ (persists across records)
//! watermark advance → close windows → emit rows → purge
//! ```
//!
//! Everything in this crate is synchronous and deterministic: emission is
//! driven purely by watermark progress, never by wall-clock time. If the
//! source stops sending records, no further rows are emitted. I/O lives in
//! the connector and facade crates.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod error;
pub mod feature;
pub mod lifecycle;
pub mod pipeline;
pub mod record;
pub mod state;
pub mod time;
pub mod window;

pub use config::EngineConfig;
pub use error::CoreError;
pub use feature::{EmittedRow, FeatureDef};
pub use pipeline::{AggregationPipeline, PipelineStats};
pub use record::Record;
pub use time::Watermark;
pub use window::WindowKind;
