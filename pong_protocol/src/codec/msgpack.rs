use super::SnapshotCodec;
use crate::error::CodecError;
use crate::frame::Frame;
use crate::snapshot::Snapshot;

/// Snapshot as a MessagePack map with named fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

impl SnapshotCodec for MsgPackCodec {
    fn encode(&self, snapshot: &Snapshot) -> Result<Frame, CodecError> {
        // Named encoding keeps the top level a fixmap, which is what receivers sniff for.
        Ok(Frame::Binary(rmp_serde::to_vec_named(snapshot)?))
    }

    fn decode(&self, frame: &Frame) -> Result<Snapshot, CodecError> {
        match frame {
            Frame::Binary(bytes) => Ok(rmp_serde::from_slice(bytes)?),
            Frame::Text(_) => Err(CodecError::WrongFrameKind),
        }
    }
}
