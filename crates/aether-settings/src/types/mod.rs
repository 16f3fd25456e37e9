//! Settings types.
//!
//! Every struct uses `#[serde(rename_all = "camelCase", default)]` so a user
//! file only needs the keys it changes.

mod buffer;
mod session;

pub use buffer::{BufferSettings, LoggingSettings, MAX_CAPACITY};
pub use session::{DEFAULT_URL, SessionSettings};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AetherSettings {
    /// Server connection.
    pub session: SessionSettings,
    /// Point buffer.
    pub buffer: BufferSettings,
    /// Logging.
    pub logging: LoggingSettings,
}

impl AetherSettings {
    /// Reject values no component can run with.
    pub fn validate(&self) -> Result<()> {
        if self.buffer.capacity == 0 {
            return Err(SettingsError::InvalidValue(
                "buffer.capacity must be greater than zero".into(),
            ));
        }
        if self.buffer.capacity > MAX_CAPACITY {
            return Err(SettingsError::InvalidValue(format!(
                "buffer.capacity must be at most {MAX_CAPACITY}, got {}",
                self.buffer.capacity
            )));
        }
        if self.session.reconnect_interval_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "session.reconnectIntervalMs must be greater than zero".into(),
            ));
        }
        if self.session.heartbeat_interval_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "session.heartbeatIntervalMs must be greater than zero".into(),
            ));
        }
        if self.session.pong_timeout_ms == Some(0) {
            return Err(SettingsError::InvalidValue(
                "session.pongTimeoutMs must be greater than zero".into(),
            ));
        }
        let url = self.session.url.as_str();
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(SettingsError::InvalidValue(format!(
                "session.url must use ws:// or wss://, got {url:?}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AetherSettings::default().validate().unwrap();
    }

    #[test]
    fn zero_capacity_rejected() {
        let mut s = AetherSettings::default();
        s.buffer.capacity = 0;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("buffer.capacity"));
    }

    #[test]
    fn capacity_above_limit_rejected() {
        let mut s = AetherSettings::default();
        s.buffer.capacity = MAX_CAPACITY;
        s.validate().unwrap();

        s.buffer.capacity = MAX_CAPACITY + 1;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("at most 100000000"));

        s.buffer.capacity = usize::MAX / 4;
        assert!(s.validate().is_err());
    }

    #[test]
    fn zero_intervals_rejected() {
        let mut s = AetherSettings::default();
        s.session.reconnect_interval_ms = 0;
        assert!(s.validate().is_err());

        let mut s = AetherSettings::default();
        s.session.heartbeat_interval_ms = 0;
        assert!(s.validate().is_err());

        let mut s = AetherSettings::default();
        s.session.pong_timeout_ms = Some(0);
        assert!(s.validate().is_err());
    }

    #[test]
    fn non_websocket_url_rejected() {
        let mut s = AetherSettings::default();
        s.session.url = "http://localhost:8000/ws/reconstruct".into();
        assert!(matches!(s.validate(), Err(SettingsError::InvalidValue(_))));

        s.session.url = "wss://recon.example.com/ws/reconstruct".into();
        s.validate().unwrap();
    }

    #[test]
    fn empty_object_deserializes_to_defaults() {
        let s: AetherSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(s, AetherSettings::default());
    }
}
