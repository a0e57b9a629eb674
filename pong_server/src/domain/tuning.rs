// Court geometry and serve tuning, in normalized [0, 1] coordinates.

pub const BALL_WIDTH: f64 = 0.02;
/// Total paddle height; paddle updates carry the center, state stores the top.
pub const PADDLE_HEIGHT: f64 = 0.2;

pub const LEFT_PADDLE_X: f64 = 0.05;
pub const RIGHT_PADDLE_X: f64 = 0.95;
pub const PADDLE_START_Y: f64 = 0.5;

pub const DEFAULT_GAME_FPS: f64 = 60.0;
pub const DEFAULT_NETWORK_FPS: f64 = 20.0;

pub mod ball {
    pub const ID: &str = "0";

    #[derive(Debug, Clone, Copy)]
    pub struct BallTuning {
        pub start_x: f64,
        pub start_y: f64,
        pub start_vx: f64,
        pub start_vy: f64,
        /// Position and speed used to serve after a point.
        pub serve_x: f64,
        pub serve_y: f64,
        pub serve_speed_x: f64,
        pub serve_vy: f64,
    }

    impl Default for BallTuning {
        fn default() -> Self {
            Self {
                start_x: 0.5,
                start_y: 0.2,
                start_vx: 0.3,
                start_vy: 0.2,
                serve_x: 0.5,
                serve_y: 0.2,
                serve_speed_x: 0.3,
                serve_vy: 0.3,
            }
        }
    }
}
