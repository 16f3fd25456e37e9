//! JSON encode/decode of [`StreamMessage`] frames.

use crate::errors::{DecodeError, EncodeError};
use crate::message::StreamMessage;

/// Decode one text frame.
pub fn decode(frame: &str) -> Result<StreamMessage, DecodeError> {
    Ok(serde_json::from_str(frame)?)
}

/// Decode one binary frame holding UTF-8 JSON.
pub fn decode_bytes(frame: &[u8]) -> Result<StreamMessage, DecodeError> {
    decode(std::str::from_utf8(frame)?)
}

/// Encode a message as one text frame.
pub fn encode(message: &StreamMessage) -> Result<String, EncodeError> {
    if matches!(message, StreamMessage::Unknown) {
        return Err(EncodeError::Unknown);
    }
    Ok(serde_json::to_string(message)?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
