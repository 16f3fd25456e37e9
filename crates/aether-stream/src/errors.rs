//! Run error types.

use thiserror::Error;

/// Why a run could not be started.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunError {
    /// The session is not connected; nothing was sent and the buffer was left
    /// untouched.
    #[error("session is not connected")]
    NotConnected,
    /// A frame of the run could not be queued part way through, because the
    /// connection dropped or the frame was over the size limit.
    #[error("upload stopped after sending {sent} of {total} inputs")]
    Interrupted {
        /// Inputs written before the failure.
        sent: usize,
        /// Inputs in the run.
        total: usize,
    },
    /// The coordinator task has stopped.
    #[error("stream coordinator is closed")]
    Closed,
}
