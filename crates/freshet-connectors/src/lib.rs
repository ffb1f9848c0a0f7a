//! # Freshet Connectors
//!
//! External collaborators for streaming records into and aggregate rows
//! out of the engine.
//!
//! Connection setup, authentication, topic naming and transport live
//! behind the [`connector::RecordSource`] / [`connector::RowSink`] seams;
//! the engine only ever sees validated [`freshet_core::Record`]s and
//! hands back [`freshet_core::EmittedRow`]s. The channel connectors are
//! the in-process transport used for embedding and tests.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod channel;
pub mod codec;
pub mod connector;
pub mod error;

pub use channel::{
    channel_sink, channel_source, ChannelSink, ChannelSource, RecordSender, RowReceiver,
};
pub use codec::{DecodeError, RecordDecoder, RowEncoder};
pub use connector::{RecordSource, RowSink, SourcePoll};
pub use error::ConnectorError;
