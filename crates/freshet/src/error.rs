//! Error types for the `Freshet` job facade.

use freshet_connectors::ConnectorError;
use freshet_core::CoreError;

/// Errors from job construction and the run loop.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Engine error.
    #[error("Engine error: {0}")]
    Core(#[from] CoreError),

    /// Connector error.
    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),

    /// No record source configured.
    #[error("No record source configured")]
    MissingSource,

    /// No row sink configured.
    #[error("No row sink configured")]
    MissingSink,
}
