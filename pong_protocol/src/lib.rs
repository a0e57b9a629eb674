//! Wire protocol shared by the Pong server and its clients.
//!
//! One logical [`Snapshot`] schema, three codecs ([`Codec`]), the JSON
//! [`ControlMessage`]s, the binary [`PaddleUpdate`], and the routing functions
//! that turn a raw [`Frame`] into a typed message without any envelope.

pub mod codec;
pub mod control;
pub mod error;
pub mod frame;
pub mod message;
pub mod snapshot;

pub use codec::{ByteCodec, Codec, JsonCodec, MsgPackCodec, SnapshotCodec};
pub use control::{ControlMessage, PING, PONG, PaddleUpdate, usable_fps};
pub use error::CodecError;
pub use frame::Frame;
pub use message::{
    ClientFrame, ServerFrame, control_frame, decode_client_frame, decode_server_frame,
    paddle_frame, ping_frame, pong_frame,
};
pub use snapshot::{BallEntry, PlayerEntry, ScoreEntry, Snapshot, SnapshotState};
