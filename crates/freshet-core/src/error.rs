//! Error types for the aggregation engine.
//!
//! The engine never fails on data: malformed records are counted and
//! dropped, late records are counted and dropped. Only invalid external
//! configuration surfaces as an error; corrupted internal state is a
//! programming bug and fails loudly via assertions instead.

/// Errors from engine construction.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Invalid externally supplied configuration.
    #[error("Config error: {0}")]
    Config(String),
}
