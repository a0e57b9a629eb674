// Control traffic: literal ping/pong, JSON control messages and the paddle update.

use crate::codec::Codec;
use serde::{Deserialize, Serialize};

pub const PING: &str = "ping";
pub const PONG: &str = "pong";

/// JSON control messages, discriminated by their `type` field.
///
/// Snapshots never carry a `type` field, which is how receivers tell the two
/// apart before committing to a parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    /// Broadcast rate change. Sent by a client as a request and rebroadcast
    /// by the server to every endpoint of the room.
    #[serde(rename = "networkFPS")]
    NetworkFps {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fps: Option<f64>,
    },
    /// Room-global codec switch.
    #[serde(rename = "serialize")]
    Serialize { method: Codec },
}

impl ControlMessage {
    pub fn network_fps(fps: f64) -> Self {
        ControlMessage::NetworkFps { fps: Some(fps) }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Returns the accepted rate, treating missing, zero, negative and
/// non-finite values as "no change".
pub fn usable_fps(fps: Option<f64>) -> Option<f64> {
    fps.filter(|v| v.is_finite() && *v > 0.0)
}

/// Desired paddle center sent by a client, in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddleUpdate {
    pub y: f64,
}
