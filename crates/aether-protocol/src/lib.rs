//! # aether-protocol
//!
//! The message contract spoken over the reconstruction WebSocket.
//!
//! Every frame is one JSON object whose `type` field selects a
//! [`StreamMessage`] variant. Decoding is total over the tag space: an
//! unrecognised `type` becomes [`StreamMessage::Unknown`] rather than an error,
//! so a newer server can add message kinds without breaking older clients.
//! Only structurally broken frames produce a [`DecodeError`].

#![deny(unsafe_code)]

pub mod codec;
pub mod errors;
pub mod message;

pub use codec::{decode, decode_bytes, encode};
pub use errors::{DecodeError, EncodeError};
pub use message::StreamMessage;
