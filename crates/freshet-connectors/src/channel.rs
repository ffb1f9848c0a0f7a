//! In-process channel connectors.
//!
//! The embedded stand-in for an external transport: a bounded tokio mpsc
//! channel on each side. Backpressure falls out of the bounded channels —
//! a slow pipeline blocks the producer, a slow row consumer blocks the
//! sink.

use async_trait::async_trait;
use tokio::sync::mpsc;

use freshet_core::{EmittedRow, Record};

use crate::connector::{RecordSource, RowSink, SourcePoll};
use crate::error::ConnectorError;

/// Producer half for a [`ChannelSource`].
///
/// Cheaply cloneable. Dropping every sender ends the stream: the source
/// reports [`SourcePoll::Closed`] on the next poll.
#[derive(Debug, Clone)]
pub struct RecordSender {
    tx: mpsc::Sender<Record>,
}

impl RecordSender {
    /// Sends one record, waiting while the channel is full.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Closed`] when the source was dropped.
    pub async fn send(&self, record: Record) -> Result<(), ConnectorError> {
        self.tx.send(record).await.map_err(|_| ConnectorError::Closed)
    }
}

/// Channel-backed record source.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<Record>,
}

/// Creates a connected (sender, source) pair with the given capacity.
#[must_use]
pub fn channel_source(capacity: usize) -> (RecordSender, ChannelSource) {
    let (tx, rx) = mpsc::channel(capacity);
    (RecordSender { tx }, ChannelSource { rx })
}

#[async_trait]
impl RecordSource for ChannelSource {
    async fn open(&mut self) -> Result<(), ConnectorError> {
        Ok(())
    }

    async fn poll(&mut self) -> Result<SourcePoll, ConnectorError> {
        match self.rx.recv().await {
            Some(record) => Ok(SourcePoll::Record(record)),
            None => Ok(SourcePoll::Closed),
        }
    }

    async fn close(&mut self) -> Result<(), ConnectorError> {
        self.rx.close();
        Ok(())
    }
}

/// Receiver half for rows written through a [`ChannelSink`].
pub type RowReceiver = mpsc::Receiver<EmittedRow>;

/// Channel-backed row sink.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<EmittedRow>,
}

/// Creates a connected (sink, receiver) pair with the given capacity.
#[must_use]
pub fn channel_sink(capacity: usize) -> (ChannelSink, RowReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (ChannelSink { tx }, rx)
}

#[async_trait]
impl RowSink for ChannelSink {
    async fn open(&mut self) -> Result<(), ConnectorError> {
        Ok(())
    }

    async fn write(&mut self, row: EmittedRow) -> Result<(), ConnectorError> {
        self.tx.send(row).await.map_err(|_| {
            ConnectorError::ConnectionFailed("row receiver dropped".to_string())
        })
    }

    async fn flush(&mut self) -> Result<(), ConnectorError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ConnectorError> {
        Ok(())
    }
}
