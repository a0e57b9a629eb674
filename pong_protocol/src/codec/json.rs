use super::SnapshotCodec;
use crate::error::CodecError;
use crate::frame::Frame;
use crate::snapshot::Snapshot;

/// Snapshot as UTF-8 JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl SnapshotCodec for JsonCodec {
    fn encode(&self, snapshot: &Snapshot) -> Result<Frame, CodecError> {
        Ok(Frame::Text(serde_json::to_string(snapshot)?))
    }

    fn decode(&self, frame: &Frame) -> Result<Snapshot, CodecError> {
        match frame {
            Frame::Text(text) => Ok(serde_json::from_str(text)?),
            Frame::Binary(_) => Err(CodecError::WrongFrameKind),
        }
    }
}
