//! Session configuration.

use std::time::Duration;

/// Default reconstruction endpoint.
pub const DEFAULT_URL: &str = "ws://localhost:8000/ws/reconstruct";
/// Default fixed delay between reconnect attempts.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(3);
/// Default ping period while connected.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
/// Default cap on one outbound frame, tungstenite's own message limit.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 << 20;

/// Configuration for a [`SessionManager`](crate::SessionManager).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// WebSocket URL of the reconstruction endpoint.
    pub url: String,
    /// Re-arm the retry timer after every close or error.
    pub auto_reconnect: bool,
    /// Fixed delay before a reconnect attempt.
    pub reconnect_interval: Duration,
    /// Ping period while connected.
    pub heartbeat_interval: Duration,
    /// Force-close when no pong arrives for this long. `None` leaves liveness
    /// to the transport.
    pub pong_timeout: Option<Duration>,
    /// Largest encoded frame [`send`](crate::SessionManager::send) accepts.
    pub max_message_bytes: usize,
}

impl SessionConfig {
    /// Defaults with a specific URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            auto_reconnect: true,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            pong_timeout: None,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}
