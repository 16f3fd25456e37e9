//! # aether-session
//!
//! One persistent duplex session with the reconstruction server.
//!
//! [`SessionManager`] owns at most one transport connection at a time and
//! drives it through [`SessionState`]:
//!
//! - explicit [`SessionManager::connect`] or the retry timer → `Connecting`
//! - transport open → `Connected`, heartbeat pings start
//! - transport close → `Disconnected`, transport error → `Errored`; both arm
//!   the same fixed-interval retry unless auto-reconnect is off
//! - [`SessionManager::disconnect`] is the only way to stop the retry loop
//!
//! Decoded inbound messages arrive, in transport order, on the receiver
//! returned by [`SessionManager::new`]. The transport itself sits behind the
//! [`Connector`] trait: [`WsConnector`] speaks WebSocket via
//! `tokio-tungstenite`, [`memory::MemoryConnector`] is an in-process pair for
//! tests.

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod heartbeat;
pub mod manager;
pub mod memory;
pub mod state;
pub mod transport;
pub mod ws;

pub use config::SessionConfig;
pub use errors::TransportError;
pub use manager::SessionManager;
pub use state::SessionState;
pub use transport::{Connection, Connector, Frame};
pub use ws::WsConnector;
