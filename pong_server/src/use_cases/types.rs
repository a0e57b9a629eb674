// Use-case level inputs/outputs for a room.

use crate::domain::RoomSnapshot;
use pong_protocol::Codec;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum RoomEvent {
    Connect { conn_id: Uuid, player_id: String },
    Disconnect { conn_id: Uuid },
    /// Desired paddle center from the sender's paddle update.
    PaddleMove { conn_id: Uuid, center_y: f64 },
    SetNetworkFps { fps: Option<f64> },
    SetCodec { codec: Codec },
}

/// Outbound traffic from a room, fanned out to every endpoint.
#[derive(Debug, Clone)]
pub enum RoomBroadcast {
    Snapshot {
        /// Wall-clock milliseconds since the Unix epoch at sampling.
        time: u64,
        state: RoomSnapshot,
        codec: Codec,
    },
    NetworkFps { fps: f64 },
}
