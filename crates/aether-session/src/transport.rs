//! Transport seam between the session manager and a concrete duplex channel.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Sink, Stream};

use crate::errors::TransportError;

/// One transport frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text payload.
    Text(String),
    /// Raw binary payload.
    Binary(Vec<u8>),
    /// Close handshake.
    Close,
}

/// Outbound half of a connection.
pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = TransportError> + Send>>;

/// Inbound half of a connection. `None` or [`Frame::Close`] ends it.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame, TransportError>> + Send>>;

/// An open duplex connection.
pub struct Connection {
    /// Frames written to the server.
    pub sink: FrameSink,
    /// Frames read from the server.
    pub stream: FrameStream,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// Opens connections to a URL.
///
/// Implementations must be cancel-safe: the session drops the `connect`
/// future when the caller disconnects mid-attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open one connection.
    async fn connect(&self, url: &str) -> Result<Connection, TransportError>;
}
