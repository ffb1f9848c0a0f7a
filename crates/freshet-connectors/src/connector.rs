//! Source and sink connector traits.
//!
//! # Lifecycle
//!
//! 1. Create the connector
//! 2. Call `open()` to establish the transport
//! 3. Call `poll()` / `write()` in a loop
//! 4. Call `close()` for clean shutdown
//!
//! The engine assumes writes eventually succeed or the surrounding
//! process fails fast; connectors own their retry policy. Sink-side
//! durability is the sink's responsibility — emission is fire-and-forget
//! from the engine's perspective.

use async_trait::async_trait;

use freshet_core::{EmittedRow, Record};

use crate::error::ConnectorError;

/// Outcome of one source poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePoll {
    /// A record was delivered.
    Record(Record),
    /// Nothing available right now; poll again.
    Idle,
    /// The source is exhausted and will deliver nothing further.
    Closed,
}

/// Delivers timestamped records into the pipeline.
///
/// Implementations own deserialization and malformed-message filtering:
/// a record that reaches the pipeline always carries a usable event time.
#[async_trait]
pub trait RecordSource: Send {
    /// Establishes the transport.
    async fn open(&mut self) -> Result<(), ConnectorError>;

    /// Waits for the next record, idle notice, or end of stream.
    async fn poll(&mut self) -> Result<SourcePoll, ConnectorError>;

    /// Releases the transport.
    async fn close(&mut self) -> Result<(), ConnectorError>;
}

/// Accepts emitted aggregate rows.
#[async_trait]
pub trait RowSink: Send {
    /// Establishes the transport.
    async fn open(&mut self) -> Result<(), ConnectorError>;

    /// Writes one row. May buffer.
    async fn write(&mut self, row: EmittedRow) -> Result<(), ConnectorError>;

    /// Flushes buffered rows.
    async fn flush(&mut self) -> Result<(), ConnectorError>;

    /// Flushes and releases the transport.
    async fn close(&mut self) -> Result<(), ConnectorError>;
}
