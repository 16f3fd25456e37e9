//! Codec error types.

use thiserror::Error;

/// A frame that could not be turned into a [`StreamMessage`](crate::StreamMessage).
///
/// The session logs and drops the offending frame; the stream continues.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Not JSON, not an object, no `type`, or a known type with a bad payload.
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
    /// A binary frame that is not UTF-8 text.
    #[error("binary frame is not UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// A message that could not be serialized.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// [`StreamMessage::Unknown`](crate::StreamMessage::Unknown) has no wire form.
    #[error("unknown messages cannot be encoded")]
    Unknown,
    /// Serialization failed.
    #[error("failed to serialize message: {0}")]
    Json(#[from] serde_json::Error),
}
