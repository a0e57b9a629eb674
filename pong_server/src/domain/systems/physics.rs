use crate::domain::state::{BallState, PlayerState, Side};
use crate::domain::tuning::{BALL_WIDTH, PADDLE_HEIGHT, ball::BallTuning};

#[derive(Debug, Clone, Copy)]
pub struct PhysicsConfig {
    pub ball_width: f64,
    pub paddle_height: f64,
    pub ball: BallTuning,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            ball_width: BALL_WIDTH,
            paddle_height: PADDLE_HEIGHT,
            ball: BallTuning::default(),
        }
    }
}

pub fn tick_players(players: &mut [PlayerState], dt: f64) {
    for p in players.iter_mut() {
        p.x += p.vx * dt;
        p.y += p.vy * dt;
    }
}

/// Advances every ball by `dt` seconds and returns the side credited for
/// each point scored this tick.
pub fn tick_balls(
    balls: &mut [BallState],
    players: &[PlayerState],
    dt: f64,
    cfg: PhysicsConfig,
) -> Vec<Side> {
    let mut scored = Vec::new();
    let max_pos = 1.0 - cfg.ball_width;

    for b in balls.iter_mut() {
        b.x += b.vx * dt;
        b.y += b.vy * dt;

        // Top/bottom walls reflect without energy loss.
        if b.y <= 0.0 {
            b.y = 0.0;
            b.vy = b.vy.abs();
        } else if b.y >= max_pos {
            b.y = max_pos;
            b.vy = -b.vy.abs();
        }

        let conceded = if b.x <= 0.0 {
            Some(Side::Left)
        } else if b.x >= max_pos {
            Some(Side::Right)
        } else {
            None
        };

        if let Some(goal) = conceded {
            let winner = goal.opposite();
            serve(b, winner, &cfg.ball);
            scored.push(winner);
            continue;
        }

        bounce_off_paddles(b, players, cfg);
    }

    scored
}

// The ball travels away from the side that just won the point.
fn serve(b: &mut BallState, winner: Side, tuning: &BallTuning) {
    b.x = tuning.serve_x;
    b.y = tuning.serve_y;
    b.vx = match winner {
        Side::Right => tuning.serve_speed_x,
        Side::Left => -tuning.serve_speed_x,
    };
    b.vy = tuning.serve_vy;
    b.snap = true;
}

fn bounce_off_paddles(b: &mut BallState, players: &[PlayerState], cfg: PhysicsConfig) {
    for p in players {
        let overlaps = b.x < p.x + cfg.ball_width
            && b.x + cfg.ball_width > p.x
            && b.y < p.y + cfg.paddle_height
            && b.y + cfg.ball_width > p.y;
        if !overlaps {
            continue;
        }

        // Flipping on every overlapping tick makes a ball that is still inside
        // the rectangle next tick flip back and stick to the paddle. Only turn
        // it around while it still heads into the paddle.
        match p.side() {
            Side::Left if b.vx < 0.0 => b.vx = -b.vx,
            Side::Right if b.vx > 0.0 => b.vx = -b.vx,
            _ => {}
        }
        break;
    }
}
