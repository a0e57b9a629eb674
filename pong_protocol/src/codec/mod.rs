//! Snapshot codecs.
//!
//! Three interchangeable wire representations of [`Snapshot`]. The sender picks
//! one by explicit [`Codec`] tag; the receiver has no envelope to read and must
//! recognise the format from the payload itself:
//!
//! | codec     | frame  | leading bytes                          |
//! |-----------|--------|----------------------------------------|
//! | `byte`    | binary | `#rf` (`0x23 0x72 0x66`)               |
//! | `msgpack` | binary | fixmap type byte `0x80..=0x8f` (`0x83`) |
//! | `json`    | text   | `{`                                    |
//!
//! JSON control messages also start with `{`; see [`crate::message`] for how
//! text is routed.

pub mod byte;
pub mod json;
pub mod msgpack;

pub use byte::ByteCodec;
pub use json::JsonCodec;
pub use msgpack::MsgPackCodec;

use crate::error::CodecError;
use crate::frame::Frame;
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Common encode/decode capability implemented by every wire format.
pub trait SnapshotCodec {
    fn encode(&self, snapshot: &Snapshot) -> Result<Frame, CodecError>;
    fn decode(&self, frame: &Frame) -> Result<Snapshot, CodecError>;
}

/// Room-global codec selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    #[default]
    Byte,
    Json,
    MsgPack,
}

impl Codec {
    pub const ALL: [Codec; 3] = [Codec::Byte, Codec::Json, Codec::MsgPack];

    pub fn encode(self, snapshot: &Snapshot) -> Result<Frame, CodecError> {
        match self {
            Codec::Byte => ByteCodec.encode(snapshot),
            Codec::Json => JsonCodec.encode(snapshot),
            Codec::MsgPack => MsgPackCodec.encode(snapshot),
        }
    }

    pub fn decode(self, frame: &Frame) -> Result<Snapshot, CodecError> {
        match self {
            Codec::Byte => ByteCodec.decode(frame),
            Codec::Json => JsonCodec.decode(frame),
            Codec::MsgPack => MsgPackCodec.decode(frame),
        }
    }

    /// Identifies the snapshot codec of a received payload from its leading bytes.
    pub fn sniff(frame: &Frame) -> Option<Codec> {
        match frame {
            Frame::Text(text) if text.starts_with('{') => Some(Codec::Json),
            Frame::Text(_) => None,
            Frame::Binary(bytes) if bytes.starts_with(byte::SNAPSHOT_TAG) => Some(Codec::Byte),
            Frame::Binary(bytes) if bytes.first().is_some_and(|b| b & 0xf0 == 0x80) => {
                Some(Codec::MsgPack)
            }
            Frame::Binary(_) => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Codec::Byte => "byte",
            Codec::Json => "json",
            Codec::MsgPack => "msgpack",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Codec {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "byte" => Ok(Codec::Byte),
            "json" => Ok(Codec::Json),
            "msgpack" => Ok(Codec::MsgPack),
            _ => Err(CodecError::UnknownFormat),
        }
    }
}
