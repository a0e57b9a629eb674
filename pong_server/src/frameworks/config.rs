use crate::domain::tuning::{DEFAULT_GAME_FPS, DEFAULT_NETWORK_FPS};
use crate::use_cases::RoomSettings;
use pong_protocol::{Codec, usable_fps};
use std::env;

// Runtime/server configuration (not gameplay tuning).

pub const ROOM_EVENT_CHANNEL_CAPACITY: usize = 1024;
pub const ROOM_BROADCAST_CAPACITY: usize = 128;

pub fn http_port() -> u16 {
    env::var("PONG_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn default_room_id() -> String {
    env::var("PONG_DEFAULT_ROOM").unwrap_or_else(|_| "my-new-room".to_string())
}

fn fps_var(key: &str, default: f64) -> f64 {
    usable_fps(env::var(key).ok().and_then(|v| v.trim().parse().ok())).unwrap_or(default)
}

pub fn game_fps() -> f64 {
    fps_var("PONG_GAME_FPS", DEFAULT_GAME_FPS)
}

pub fn network_fps() -> f64 {
    fps_var("PONG_NETWORK_FPS", DEFAULT_NETWORK_FPS)
}

pub fn default_codec() -> Codec {
    env::var("PONG_DEFAULT_CODEC")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

pub fn fixed_timestep() -> bool {
    env::var("PONG_FIXED_TIMESTEP")
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

pub fn room_settings() -> RoomSettings {
    RoomSettings {
        event_channel_capacity: ROOM_EVENT_CHANNEL_CAPACITY,
        broadcast_capacity: ROOM_BROADCAST_CAPACITY,
        game_fps: game_fps(),
        network_fps: network_fps(),
        codec: default_codec(),
        fixed_timestep: fixed_timestep(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_truthy_spellings() {
        for v in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(parse_flag(v), "{v}");
        }
        for v in ["0", "false", "", "nope"] {
            assert!(!parse_flag(v), "{v}");
        }
    }
}
