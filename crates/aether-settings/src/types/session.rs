//! Session connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default reconstruction endpoint.
pub const DEFAULT_URL: &str = "ws://localhost:8000/ws/reconstruct";

/// How the client reaches and keeps its server connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// WebSocket URL of the reconstruction endpoint.
    pub url: String,
    /// Reconnect after every close or error.
    pub auto_reconnect: bool,
    /// Fixed delay between reconnect attempts in milliseconds.
    pub reconnect_interval_ms: u64,
    /// Ping period while connected in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// Force a reconnect when no pong arrives within this many milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pong_timeout_ms: Option<u64>,
}

impl SessionSettings {
    /// Reconnect delay as a [`Duration`].
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// Heartbeat period as a [`Duration`].
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Pong timeout as a [`Duration`], if configured.
    pub fn pong_timeout(&self) -> Option<Duration> {
        self.pong_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            auto_reconnect: true,
            reconnect_interval_ms: 3_000,
            heartbeat_interval_ms: 30_000,
            pong_timeout_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = SessionSettings::default();
        assert_eq!(s.url, DEFAULT_URL);
        assert!(s.auto_reconnect);
        assert_eq!(s.reconnect_interval(), Duration::from_secs(3));
        assert_eq!(s.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(s.pong_timeout(), None);
    }

    #[test]
    fn camel_case_keys() {
        let json = serde_json::to_value(SessionSettings::default()).unwrap();
        assert!(json.get("reconnectIntervalMs").is_some());
        assert!(json.get("autoReconnect").is_some());
        assert!(json.get("pongTimeoutMs").is_none());
    }

    #[test]
    fn pong_timeout_from_json() {
        let s: SessionSettings = serde_json::from_str(r#"{"pongTimeoutMs": 90000}"#).unwrap();
        assert_eq!(s.pong_timeout(), Some(Duration::from_secs(90)));
        assert_eq!(s.url, DEFAULT_URL);
    }
}
