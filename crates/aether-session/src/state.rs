//! Session connection state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the session is in its connect/retry cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No transport and no attempt in flight.
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The transport is open; `send` writes frames.
    Connected,
    /// The last attempt or connection failed; a retry may be pending.
    Errored,
}

impl SessionState {
    /// Whether frames can be written.
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Errored => "errored",
        };
        f.write_str(s)
    }
}
