// Logical snapshot schema shared by every codec.

use serde::{Deserialize, Serialize};

/// One sampled state of a room, as sent from the server to every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Short random identifier, fresh for every broadcast.
    pub id: String,
    /// Server wall-clock time at sampling, in milliseconds since the Unix epoch.
    pub time: u64,
    pub state: SnapshotState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotState {
    pub players: Vec<PlayerEntry>,
    pub balls: Vec<BallEntry>,
    pub scores: Vec<ScoreEntry>,
}

/// Paddle position as seen by clients (velocity stays on the server).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallEntry {
    pub id: String,
    pub x: f64,
    pub y: f64,
    // Carried as 0/1 on the wire.
    #[serde(with = "flag")]
    pub snap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub id: String,
    pub score: u32,
}

impl Snapshot {
    /// Looks up a score by side id ("left" / "right").
    pub fn score(&self, side: &str) -> Option<u32> {
        self.state
            .scores
            .iter()
            .find(|s| s.id == side)
            .map(|s| s.score)
    }
}

mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(u8::deserialize(deserializer)? != 0)
    }
}

#[cfg(test)]
pub(crate) fn sample_snapshot() -> Snapshot {
    Snapshot {
        id: "a1b2c3".to_string(),
        time: 1_700_000_000_123,
        state: SnapshotState {
            players: vec![
                PlayerEntry {
                    id: "9f86d081".to_string(),
                    x: 0.05,
                    y: 0.4,
                },
                PlayerEntry {
                    id: "2c26b46b".to_string(),
                    x: 0.95,
                    y: 0.5,
                },
            ],
            balls: vec![BallEntry {
                id: "0".to_string(),
                x: 0.5,
                y: 0.2,
                snap: true,
            }],
            scores: vec![
                ScoreEntry {
                    id: "left".to_string(),
                    score: 3,
                },
                ScoreEntry {
                    id: "right".to_string(),
                    score: 7,
                },
            ],
        },
    }
}
