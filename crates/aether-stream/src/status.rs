//! Observable run status.

use std::fmt;

use aether_core::RunId;

/// Where the current run is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RunPhase {
    /// No run started.
    #[default]
    Idle,
    /// Inputs are being sent.
    Uploading,
    /// At least one batch has arrived.
    Streaming,
    /// The server reported the end of the run.
    Complete {
        /// Point total reported by the server.
        total_points: u64,
    },
    /// The server reported a run-level failure.
    Failed {
        /// Server message, verbatim.
        message: String,
    },
}

impl RunPhase {
    /// Whether no further batches are expected for this run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Failed { .. })
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Uploading => f.write_str("uploading"),
            Self::Streaming => f.write_str("streaming"),
            Self::Complete { total_points } => write!(f, "complete ({total_points} points)"),
            Self::Failed { message } => write!(f, "failed: {message}"),
        }
    }
}

/// Snapshot published after every change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamStatus {
    /// Active run, if one was started.
    pub run_id: Option<RunId>,
    /// Phase of the active run.
    pub phase: RunPhase,
    /// Points visible in the buffer.
    pub point_count: usize,
    /// Points dropped at capacity since the last clear.
    pub dropped: usize,
    /// Buffer generation.
    pub generation: u64,
    /// Batches rejected for carrying another run's id. Never reset.
    pub stale_batches: u64,
    /// Inputs the server acknowledged in this run.
    pub acknowledged_inputs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_phases() {
        assert!(!RunPhase::Idle.is_terminal());
        assert!(!RunPhase::Streaming.is_terminal());
        assert!(RunPhase::Complete { total_points: 0 }.is_terminal());
        assert!(RunPhase::Failed { message: "x".into() }.is_terminal());
    }

    #[test]
    fn phase_display() {
        assert_eq!(
            RunPhase::Complete { total_points: 10 }.to_string(),
            "complete (10 points)"
        );
        assert_eq!(
            RunPhase::Failed {
                message: "GPU out of memory".into()
            }
            .to_string(),
            "failed: GPU out of memory"
        );
    }
}
