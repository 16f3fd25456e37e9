//! Opaque input units uploaded at the start of a run.

use aether_core::RunId;
use aether_protocol::StreamMessage;

/// One input file. The payload is opaque to the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputUnit {
    /// Name reported to the server.
    pub filename: String,
    /// MIME type used for the data URL.
    pub mime: String,
    /// Raw payload.
    pub bytes: Vec<u8>,
}

impl InputUnit {
    /// Build an input unit.
    pub fn new(filename: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Wire message for this unit, tagged with `run`.
    pub fn to_message(&self, run: &RunId) -> StreamMessage {
        StreamMessage::input_from_bytes(self.filename.clone(), &self.mime, &self.bytes)
            .with_run_id(run.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_tagged_data_url() {
        let unit = InputUnit::new("a.png", "image/png", vec![1, 2, 3]);
        let run = RunId::from("run-1");
        match unit.to_message(&run) {
            StreamMessage::InputBatch {
                data,
                filename,
                run_id,
            } => {
                assert_eq!(filename, "a.png");
                assert_eq!(data, "data:image/png;base64,AQID");
                assert_eq!(run_id, Some(run));
            }
            other => panic!("unexpected message {other:?}"),
        }
    }
}
