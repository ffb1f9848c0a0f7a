//! Per-sink task that owns a [`RowSink`] and processes commands via a
//! bounded channel.
//!
//! This decouples the job loop from sink I/O: the loop hands rows to the
//! task and moves on, with backpressure through the bounded channel.
//! The task processes commands sequentially:
//! - `WriteRow` — write one emitted row
//! - `Close` — flush + close the sink and exit the task

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use freshet_connectors::{ConnectorError, RowSink};
use freshet_core::EmittedRow;

/// Commands sent to a sink's dedicated task.
enum SinkCommand {
    /// Write a row to the sink.
    WriteRow(EmittedRow),
    /// Flush + close the sink and exit the task.
    Close {
        ack: oneshot::Sender<Result<(), ConnectorError>>,
    },
}

/// Handle for sending commands to the sink task.
pub(crate) struct SinkTaskHandle {
    tx: mpsc::Sender<SinkCommand>,
}

impl SinkTaskHandle {
    /// Spawns a task owning an already-opened sink.
    pub fn spawn(sink: Box<dyn RowSink>, channel_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(channel_capacity);
        tokio::spawn(run_sink_task(sink, rx));
        Self { tx }
    }

    /// Sends a row to be written. Blocks only when the channel is full
    /// (bounded-channel backpressure).
    pub async fn write_row(&self, row: EmittedRow) -> Result<(), ConnectorError> {
        self.tx
            .send(SinkCommand::WriteRow(row))
            .await
            .map_err(|_| ConnectorError::ConnectionFailed("sink task closed unexpectedly".into()))
    }

    /// Flushes and closes the sink, waiting for acknowledgment.
    pub async fn close(&self) -> Result<(), ConnectorError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(SinkCommand::Close { ack: ack_tx })
            .await
            .map_err(|_| ConnectorError::ConnectionFailed("sink task closed unexpectedly".into()))?;
        ack_rx.await.map_err(|_| {
            ConnectorError::ConnectionFailed("sink task dropped close acknowledgment".into())
        })?
    }
}

async fn run_sink_task(mut sink: Box<dyn RowSink>, mut rx: mpsc::Receiver<SinkCommand>) {
    let mut written: u64 = 0;
    while let Some(command) = rx.recv().await {
        match command {
            SinkCommand::WriteRow(row) => {
                if let Err(err) = sink.write(row).await {
                    // Emission is fire-and-forget for the engine; a dead
                    // sink surfaces as a closed task on the next send.
                    error!(error = %err, "sink write failed, stopping sink task");
                    return;
                }
                written += 1;
            }
            SinkCommand::Close { ack } => {
                let result = async {
                    sink.flush().await?;
                    sink.close().await
                }
                .await;
                debug!(rows_written = written, "sink task closed");
                let _ = ack.send(result);
                return;
            }
        }
    }
    // All handles dropped without Close: still release the sink.
    if let Err(err) = sink.close().await {
        error!(error = %err, "sink close failed");
    }
}
