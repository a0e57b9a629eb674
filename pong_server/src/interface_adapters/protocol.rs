// Conversions between room output and the shared wire protocol.

use crate::domain::{BallSnapshot, PlayerSnapshot, RoomSnapshot, Score};
use crate::interface_adapters::utils::ids::snapshot_id;
use crate::use_cases::RoomBroadcast;
use axum::extract::ws::Message;
use pong_protocol::{
    BallEntry, CodecError, ControlMessage, Frame, PlayerEntry, ScoreEntry, Snapshot,
    SnapshotState, control_frame,
};

impl From<&PlayerSnapshot> for PlayerEntry {
    fn from(p: &PlayerSnapshot) -> Self {
        Self {
            id: p.id.clone(),
            x: p.x,
            y: p.y,
        }
    }
}

impl From<&BallSnapshot> for BallEntry {
    fn from(b: &BallSnapshot) -> Self {
        Self {
            id: b.id.clone(),
            x: b.x,
            y: b.y,
            snap: b.snap,
        }
    }
}

impl From<&Score> for ScoreEntry {
    fn from(s: &Score) -> Self {
        Self {
            id: s.side.as_str().to_string(),
            score: s.score,
        }
    }
}

pub fn wire_snapshot(id: String, time: u64, state: &RoomSnapshot) -> Snapshot {
    Snapshot {
        id,
        time,
        state: SnapshotState {
            players: state.players.iter().map(PlayerEntry::from).collect(),
            balls: state.balls.iter().map(BallEntry::from).collect(),
            scores: state.scores.iter().map(ScoreEntry::from).collect(),
        },
    }
}

/// Encodes one room broadcast into the frame every endpoint receives.
pub fn encode_broadcast(update: &RoomBroadcast) -> Result<Frame, CodecError> {
    match update {
        RoomBroadcast::Snapshot { time, state, codec } => {
            codec.encode(&wire_snapshot(snapshot_id(), *time, state))
        }
        RoomBroadcast::NetworkFps { fps } => control_frame(&ControlMessage::network_fps(*fps)),
    }
}

pub fn frame_to_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Binary(bytes) => Message::Binary(bytes.into()),
    }
}

/// Data frames only; WebSocket control frames map to `None`.
pub fn message_to_frame(msg: &Message) -> Option<Frame> {
    match msg {
        Message::Text(text) => Some(Frame::Text(text.as_str().to_owned())),
        Message::Binary(bytes) => Some(Frame::Binary(bytes.to_vec())),
        Message::Ping(_) | Message::Pong(_) | Message::Close(_) => None,
    }
}
