//! The message envelope.

use aether_core::{PointSample, RunId};
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// One frame on the reconstruction channel.
///
/// Variant names describe the role in the client; the wire tags follow the
/// server's vocabulary (`points`, `image_data`, `reconstruction_complete`, ...).
/// `run_id` fields are optional and omitted from the wire when unset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// Client liveness check.
    Ping,
    /// Server liveness reply.
    Pong,
    /// One batch of reconstructed samples.
    #[serde(rename = "points")]
    PointBatch {
        /// Samples in arrival order.
        data: Vec<PointSample>,
        /// Run the batch belongs to, when the server echoes it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<RunId>,
    },
    /// One opaque input unit for the reconstruction service.
    #[serde(rename = "image_data")]
    InputBatch {
        /// Encoded payload, typically a base64 data URL.
        data: String,
        /// Label of the input.
        filename: String,
        /// Run the input belongs to.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<RunId>,
    },
    /// All inputs of the run have been sent.
    UploadComplete {
        /// Number of inputs sent.
        count: u64,
        /// Run being completed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<RunId>,
    },
    /// The server received one input.
    #[serde(rename = "image_received")]
    InputAcknowledged {
        /// Server-side processing status.
        #[serde(default)]
        status: String,
        /// Label of the acknowledged input.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
    /// End of a successful run.
    #[serde(rename = "reconstruction_complete")]
    StreamComplete {
        /// Points the server produced for the run.
        total_points: u64,
        /// Run that completed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<RunId>,
    },
    /// Run-level failure reported by the server.
    Error {
        /// Human-readable description.
        message: String,
    },
    /// Any tag this client does not know.
    #[serde(other)]
    Unknown,
}

impl StreamMessage {
    /// Wire tag of this message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::PointBatch { .. } => "points",
            Self::InputBatch { .. } => "image_data",
            Self::UploadComplete { .. } => "upload_complete",
            Self::InputAcknowledged { .. } => "image_received",
            Self::StreamComplete { .. } => "reconstruction_complete",
            Self::Error { .. } => "error",
            Self::Unknown => "unknown",
        }
    }

    /// A point batch without run tag.
    pub fn points(data: Vec<PointSample>) -> Self {
        Self::PointBatch { data, run_id: None }
    }

    /// An input unit whose bytes are sent as a base64 `data:` URL.
    pub fn input_from_bytes(filename: impl Into<String>, mime: &str, bytes: &[u8]) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self::InputBatch {
            data: format!("data:{mime};base64,{encoded}"),
            filename: filename.into(),
            run_id: None,
        }
    }

    /// Upload-complete signal for `count` inputs.
    pub fn upload_complete(count: u64) -> Self {
        Self::UploadComplete {
            count,
            run_id: None,
        }
    }

    /// Tag the message with `run`. Variants without a run field are unchanged.
    #[must_use]
    pub fn with_run_id(mut self, run: RunId) -> Self {
        match &mut self {
            Self::PointBatch { run_id, .. }
            | Self::InputBatch { run_id, .. }
            | Self::UploadComplete { run_id, .. }
            | Self::StreamComplete { run_id, .. } => *run_id = Some(run),
            Self::Ping
            | Self::Pong
            | Self::InputAcknowledged { .. }
            | Self::Error { .. }
            | Self::Unknown => {}
        }
        self
    }

    /// Run tag carried by the message, if any.
    pub fn run_id(&self) -> Option<&RunId> {
        match self {
            Self::PointBatch { run_id, .. }
            | Self::InputBatch { run_id, .. }
            | Self::UploadComplete { run_id, .. }
            | Self::StreamComplete { run_id, .. } => run_id.as_ref(),
            _ => None,
        }
    }
}
