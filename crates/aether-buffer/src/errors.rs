//! Buffer error types.

use thiserror::Error;

/// Errors raised while constructing a point buffer.
///
/// Appends never fail: overflow is reported through
/// [`AppendOutcome`](crate::AppendOutcome) instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    /// The requested capacity is zero or too large to address.
    #[error("invalid point buffer capacity: {capacity}")]
    InvalidCapacity {
        /// The rejected capacity.
        capacity: usize,
    },
}

/// Result type for buffer operations.
pub type Result<T> = std::result::Result<T, BufferError>;
