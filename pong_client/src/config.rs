use pong_protocol::{Codec, usable_fps};
use std::env;
use url::Url;

// Client runtime configuration.

pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:3001/ws";
pub const DEFAULT_ROOM: &str = "my-new-room";
/// Rate assumed until the room rebroadcasts a different one.
pub const DEFAULT_NETWORK_FPS: f64 = 20.0;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub room: String,
    pub interpolate: bool,
    /// Codec to ask the room for right after connecting.
    pub request_codec: Option<Codec>,
    /// Broadcast rate to ask the room for right after connecting.
    pub request_network_fps: Option<f64>,
    pub follow_ball: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            room: DEFAULT_ROOM.to_string(),
            interpolate: true,
            request_codec: None,
            request_network_fps: None,
            follow_ball: true,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_url: env::var("PONG_SERVER_URL").unwrap_or(defaults.server_url),
            room: env::var("PONG_ROOM").unwrap_or(defaults.room),
            interpolate: flag_var("PONG_INTERPOLATE", defaults.interpolate),
            request_codec: env::var("PONG_REQUEST_CODEC")
                .ok()
                .and_then(|v| v.parse().ok()),
            request_network_fps: usable_fps(
                env::var("PONG_REQUEST_NETWORK_FPS")
                    .ok()
                    .and_then(|v| v.trim().parse().ok()),
            ),
            follow_ball: flag_var("PONG_FOLLOW_BALL", defaults.follow_ball),
        }
    }

    /// Server endpoint with the room selected through `?room=`.
    pub fn room_url(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.server_url)?;
        url.query_pairs_mut().append_pair("room", &self.room);
        Ok(url)
    }
}

fn flag_var(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| parse_flag(&v))
        .unwrap_or(default)
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_url_carries_room_query() {
        let config = ClientConfig {
            room: "lobby_7".into(),
            ..ClientConfig::default()
        };
        let url = config.room_url().expect("url");
        assert_eq!(url.as_str(), "ws://127.0.0.1:3001/ws?room=lobby_7");
    }

    #[test]
    fn room_url_rejects_garbage_base() {
        let config = ClientConfig {
            server_url: "not a url".into(),
            ..ClientConfig::default()
        };
        assert!(config.room_url().is_err());
    }

    #[test]
    fn flags_parse_both_ways() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
