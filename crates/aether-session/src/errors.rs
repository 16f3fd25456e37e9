//! Transport error types.

use thiserror::Error;

/// Failures of the duplex transport.
///
/// These never leave the session: each one ends the current connection and
/// feeds the reconnect loop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Opening the connection failed.
    #[error("failed to connect to {url}: {reason}")]
    Connect {
        /// Target URL.
        url: String,
        /// Underlying cause.
        reason: String,
    },
    /// Writing a frame failed.
    #[error("send failed: {0}")]
    Send(String),
    /// Reading a frame failed.
    #[error("receive failed: {0}")]
    Receive(String),
    /// No pong arrived within the configured window.
    #[error("no pong received within {timeout_ms}ms")]
    PongTimeout {
        /// The configured timeout.
        timeout_ms: u64,
    },
}
