//! In-process transport for tests.
//!
//! [`MemoryConnector`] hands every accepted connection's server side to the
//! test through a channel, so a test can play the reconstruction server
//! without a socket.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;

use aether_protocol::{StreamMessage, decode, encode};

use crate::errors::TransportError;
use crate::transport::{Connection, Connector, Frame};

/// Scripted connector. Attempts fail while the failure budget lasts, then
/// succeed.
#[derive(Debug)]
pub struct MemoryConnector {
    failures: Mutex<VecDeque<String>>,
    delay: Option<Duration>,
    attempts: AtomicUsize,
    servers: mpsc::UnboundedSender<ServerEnd>,
}

impl MemoryConnector {
    /// Connector plus the receiver of server ends, one per accepted
    /// connection.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerEnd>) {
        let (servers, accepted) = mpsc::unbounded();
        let connector = Self {
            failures: Mutex::new(VecDeque::new()),
            delay: None,
            attempts: AtomicUsize::new(0),
            servers,
        };
        (connector, accepted)
    }

    /// Fail the next `count` attempts.
    #[must_use]
    pub fn failing(self, count: usize) -> Self {
        self.failures
            .lock()
            .extend((0..count).map(|i| format!("scripted failure {}", i + 1)));
        self
    }

    /// Hold every attempt for `delay` before resolving it.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `connect` has been entered.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &str) -> Result<Connection, TransportError> {
        let _ = self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = self.failures.lock().pop_front() {
            return Err(TransportError::Connect {
                url: url.to_string(),
                reason,
            });
        }

        let (to_client, client_rx) = mpsc::unbounded::<Result<Frame, TransportError>>();
        let (client_tx, from_client) = mpsc::unbounded::<Frame>();
        let server = ServerEnd {
            to_client,
            from_client,
        };
        self.servers
            .unbounded_send(server)
            .map_err(|_| TransportError::Connect {
                url: url.to_string(),
                reason: "server end dropped".into(),
            })?;

        Ok(Connection {
            sink: Box::pin(client_tx.sink_map_err(|e| TransportError::Send(e.to_string()))),
            stream: Box::pin(client_rx),
        })
    }
}

/// Server side of one in-memory connection.
#[derive(Debug)]
pub struct ServerEnd {
    to_client: mpsc::UnboundedSender<Result<Frame, TransportError>>,
    from_client: mpsc::UnboundedReceiver<Frame>,
}

impl ServerEnd {
    /// Push a raw text frame.
    pub fn send_text(&self, text: impl Into<String>) {
        let _ = self.to_client.unbounded_send(Ok(Frame::Text(text.into())));
    }

    /// Push a raw binary frame.
    pub fn send_binary(&self, bytes: impl Into<Vec<u8>>) {
        let _ = self.to_client.unbounded_send(Ok(Frame::Binary(bytes.into())));
    }

    /// Push an encoded message. [`StreamMessage::Unknown`] has no wire form
    /// and is skipped.
    pub fn send_message(&self, message: &StreamMessage) {
        if let Ok(text) = encode(message) {
            self.send_text(text);
        }
    }

    /// Fail the client's read side.
    pub fn fail(&self, reason: impl Into<String>) {
        let _ = self
            .to_client
            .unbounded_send(Err(TransportError::Receive(reason.into())));
    }

    /// Close from the server side.
    pub fn close(&self) {
        let _ = self.to_client.unbounded_send(Ok(Frame::Close));
        self.to_client.close_channel();
    }

    /// Next frame written by the client, or `None` once the client side is
    /// gone.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.from_client.next().await
    }

    /// Next text frame decoded as a message, skipping undecodable frames.
    pub async fn recv_message(&mut self) -> Option<StreamMessage> {
        loop {
            match self.recv().await? {
                Frame::Text(text) => {
                    if let Ok(message) = decode(&text) {
                        return Some(message);
                    }
                }
                Frame::Close => return None,
                Frame::Binary(_) => {}
            }
        }
    }
}
