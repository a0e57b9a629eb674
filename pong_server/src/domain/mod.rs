// Domain layer: court entities, tuning and simulation rules.

pub mod ports;
pub mod state;
pub mod systems;
pub mod tuning;

pub use ports::Clock;
pub use state::{
    BallSnapshot, BallState, PlayerSnapshot, PlayerState, RoomSnapshot, Score, Scoreboard, Side,
};
