// Court entities owned by a room, plus the velocity-free views it samples.

use super::tuning::{LEFT_PADDLE_X, PADDLE_START_Y, RIGHT_PADDLE_X, ball::BallTuning};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Court edge for the n-th concurrent player (even left, odd right).
    pub fn for_join_index(index: usize) -> Side {
        if index % 2 == 0 { Side::Left } else { Side::Right }
    }

    pub fn paddle_x(self) -> f64 {
        match self {
            Side::Left => LEFT_PADDLE_X,
            Side::Right => RIGHT_PADDLE_X,
        }
    }
}

pub struct PlayerState {
    /// Connection identity; players are removed by this, never by `id`.
    pub conn_id: Uuid,
    pub id: String,
    pub x: f64,
    pub y: f64,

    // Movement-only state (never leaves the server)
    pub vx: f64,
    pub vy: f64,
}

impl PlayerState {
    pub fn new(conn_id: Uuid, id: String, side: Side) -> Self {
        Self {
            conn_id,
            id,
            x: side.paddle_x(),
            y: PADDLE_START_Y,
            vx: 0.0,
            vy: 0.0,
        }
    }

    /// Paddles left of the court center defend the left goal.
    pub fn side(&self) -> Side {
        if self.x < 0.5 { Side::Left } else { Side::Right }
    }
}

pub struct BallState {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Set on the tick the ball is re-served; cleared after the next broadcast.
    pub snap: bool,
}

impl BallState {
    pub fn initial(id: &str, tuning: &BallTuning) -> Self {
        Self {
            id: id.to_string(),
            x: tuning.start_x,
            y: tuning.start_y,
            vx: tuning.start_vx,
            vy: tuning.start_vy,
            snap: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub side: Side,
    pub score: u32,
}

/// One score per side for the lifetime of the room; only ever increases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scoreboard {
    left: u32,
    right: u32,
}

impl Scoreboard {
    pub fn award(&mut self, side: Side) {
        let slot = match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn entries(&self) -> Vec<Score> {
        Side::BOTH
            .into_iter()
            .map(|side| Score {
                side,
                score: self.get(side),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BallSnapshot {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub snap: bool,
}

/// Sampled court state without velocities, in room order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomSnapshot {
    pub players: Vec<PlayerSnapshot>,
    pub balls: Vec<BallSnapshot>,
    pub scores: Vec<Score>,
}

impl From<&PlayerState> for PlayerSnapshot {
    fn from(p: &PlayerState) -> Self {
        Self {
            id: p.id.clone(),
            x: p.x,
            y: p.y,
        }
    }
}

impl From<&BallState> for BallSnapshot {
    fn from(b: &BallState) -> Self {
        Self {
            id: b.id.clone(),
            x: b.x,
            y: b.y,
            snap: b.snap,
        }
    }
}
