//! Connector error types.

/// Errors from source and sink connectors.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// Transport-level failure (connection, channel teardown).
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The connector was used after close.
    #[error("Connector is closed")]
    Closed,

    /// Payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serde(String),
}
