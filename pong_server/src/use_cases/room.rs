// Authoritative room: owns the court and drives the simulation and broadcast loops.

use super::registry::RoomSettings;
use super::types::{RoomBroadcast, RoomEvent};
use crate::domain::systems::physics::{self, PhysicsConfig};
use crate::domain::tuning::{PADDLE_HEIGHT, ball};
use crate::domain::{
    BallSnapshot, BallState, Clock, PlayerSnapshot, PlayerState, RoomSnapshot, Scoreboard, Side,
};
use pong_protocol::{Codec, usable_fps};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};
use uuid::Uuid;

const MIN_PERIOD: Duration = Duration::from_millis(1);
const MAX_PERIOD: Duration = Duration::from_secs(3600);

fn period(fps: f64) -> Duration {
    Duration::try_from_secs_f64(1.0 / fps)
        .unwrap_or(MAX_PERIOD)
        .clamp(MIN_PERIOD, MAX_PERIOD)
}

pub struct Room {
    players: Vec<PlayerState>,
    balls: Vec<BallState>,
    scores: Scoreboard,
    codec: Codec,
    game_fps: f64,
    network_fps: f64,
    fixed_timestep: bool,
    physics: PhysicsConfig,

    // Both loops run only while at least one endpoint is connected. A tick
    // that was already scheduled when this flips to false fires as a no-op.
    looping: bool,
    last_tick: Option<Instant>,
    next_tick: Option<Instant>,
    next_broadcast: Option<Instant>,
}

impl Room {
    pub fn new(settings: &RoomSettings) -> Self {
        let physics = PhysicsConfig::default();
        Self {
            players: Vec::new(),
            balls: vec![BallState::initial(ball::ID, &physics.ball)],
            scores: Scoreboard::default(),
            codec: settings.codec,
            game_fps: settings.game_fps,
            network_fps: settings.network_fps,
            fixed_timestep: settings.fixed_timestep,
            physics,
            looping: false,
            last_tick: None,
            next_tick: None,
            next_broadcast: None,
        }
    }

    /// Applies one inbound event; returns what must be rebroadcast, if anything.
    pub fn apply(&mut self, event: RoomEvent, now: Instant) -> Option<RoomBroadcast> {
        match event {
            RoomEvent::Connect { conn_id, player_id } => {
                let side = self.connect(conn_id, player_id.clone(), now);
                info!(
                    %player_id,
                    side = side.as_str(),
                    players = self.players.len(),
                    "player joined"
                );
                None
            }
            RoomEvent::Disconnect { conn_id } => {
                if self.disconnect(conn_id) {
                    info!(players = self.players.len(), "player left");
                    if !self.looping {
                        info!("room empty; loops stopping");
                    }
                }
                None
            }
            RoomEvent::PaddleMove { conn_id, center_y } => {
                if !self.move_paddle(conn_id, center_y) {
                    debug!(%conn_id, "paddle update ignored");
                }
                None
            }
            RoomEvent::SetNetworkFps { fps } => match self.set_network_fps(fps) {
                Some(fps) => {
                    info!(fps, "network rate changed");
                    Some(RoomBroadcast::NetworkFps { fps })
                }
                None => {
                    debug!(?fps, "unusable network rate ignored");
                    None
                }
            },
            RoomEvent::SetCodec { codec } => {
                self.set_codec(codec);
                info!(%codec, "codec switched");
                None
            }
        }
    }

    /// Adds a paddle on the edge picked by the current player count and
    /// starts both loops if the room was idle.
    pub fn connect(&mut self, conn_id: Uuid, player_id: String, now: Instant) -> Side {
        let side = Side::for_join_index(self.players.len());
        self.players.push(PlayerState::new(conn_id, player_id, side));
        if !self.looping {
            self.start_loops(now);
        }
        side
    }

    pub fn disconnect(&mut self, conn_id: Uuid) -> bool {
        let before = self.players.len();
        self.players.retain(|p| p.conn_id != conn_id);
        if self.players.is_empty() {
            self.looping = false;
        }
        self.players.len() != before
    }

    /// Stores the paddle top for a requested center, keeping the whole paddle
    /// on the court. Unknown senders and non-finite values are ignored.
    pub fn move_paddle(&mut self, conn_id: Uuid, center_y: f64) -> bool {
        if !center_y.is_finite() {
            return false;
        }
        let Some(p) = self.players.iter_mut().find(|p| p.conn_id == conn_id) else {
            return false;
        };
        p.y = (center_y - PADDLE_HEIGHT / 2.0).clamp(0.0, 1.0 - PADDLE_HEIGHT);
        true
    }

    pub fn set_network_fps(&mut self, fps: Option<f64>) -> Option<f64> {
        let fps = usable_fps(fps)?;
        self.network_fps = fps;
        Some(fps)
    }

    pub fn set_codec(&mut self, codec: Codec) {
        self.codec = codec;
    }

    // Replaces any pending deadline, so a restart never leaves two chains.
    fn start_loops(&mut self, now: Instant) {
        self.looping = true;
        self.last_tick = Some(now);
        self.next_tick = Some(now + period(self.game_fps));
        self.next_broadcast = Some(now);
    }

    pub fn simulation_tick(&mut self, now: Instant) {
        if !self.looping {
            self.next_tick = None;
            return;
        }

        let dt = if self.fixed_timestep {
            1.0 / self.game_fps
        } else {
            self.last_tick
                .map_or(0.0, |last| now.saturating_duration_since(last).as_secs_f64())
        };
        self.last_tick = Some(now);

        physics::tick_players(&mut self.players, dt);
        for side in physics::tick_balls(&mut self.balls, &self.players, dt, self.physics) {
            self.scores.award(side);
            info!(
                side = side.as_str(),
                left = self.scores.get(Side::Left),
                right = self.scores.get(Side::Right),
                "point scored"
            );
        }

        self.next_tick = Some(now + period(self.game_fps));
    }

    /// Samples the court for one broadcast, then clears every ball's `snap`.
    pub fn broadcast_tick(&mut self, now: Instant, wall_millis: u64) -> Option<RoomBroadcast> {
        if !self.looping {
            self.next_broadcast = None;
            return None;
        }

        let state = self.snapshot();
        for b in &mut self.balls {
            b.snap = false;
        }
        self.next_broadcast = Some(now + period(self.network_fps));

        Some(RoomBroadcast::Snapshot {
            time: wall_millis,
            state,
            codec: self.codec,
        })
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            players: self.players.iter().map(PlayerSnapshot::from).collect(),
            balls: self.balls.iter().map(BallSnapshot::from).collect(),
            scores: self.scores.entries(),
        }
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn next_tick_at(&self) -> Option<Instant> {
        self.next_tick
    }

    pub fn next_broadcast_at(&self) -> Option<Instant> {
        self.next_broadcast
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn network_fps(&self) -> f64 {
        self.network_fps
    }

    pub fn scores(&self) -> Scoreboard {
        self.scores
    }

    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }
}

async fn sleep_until_some(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Single owner of a room's state. Inbound events and both timers are
/// handled one at a time; whichever is ready first runs first.
pub async fn room_task(
    mut room: Room,
    mut events_rx: mpsc::Receiver<RoomEvent>,
    updates_tx: broadcast::Sender<RoomBroadcast>,
    clock: Arc<dyn Clock>,
) {
    loop {
        let tick_at = room.next_tick_at();
        let broadcast_at = room.next_broadcast_at();

        tokio::select! {
            event = events_rx.recv() => {
                let Some(event) = event else {
                    debug!("room event channel closed; room task exiting");
                    break;
                };
                if let Some(update) = room.apply(event, Instant::now()) {
                    // No subscribers just means nobody is listening yet.
                    let _ = updates_tx.send(update);
                }
            }
            _ = sleep_until_some(tick_at) => {
                room.simulation_tick(Instant::now());
            }
            _ = sleep_until_some(broadcast_at) => {
                if let Some(update) = room.broadcast_tick(Instant::now(), clock.now_epoch_millis()) {
                    let _ = updates_tx.send(update);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_epoch_millis(&self) -> u64 {
            self.0
        }
    }

    fn t0() -> Instant {
        Instant::from_std(std::time::Instant::now())
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn room() -> Room {
        Room::new(&RoomSettings::default())
    }

    fn snapshot_of(update: Option<RoomBroadcast>) -> (u64, RoomSnapshot, Codec) {
        match update {
            Some(RoomBroadcast::Snapshot { time, state, codec }) => (time, state, codec),
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn connect_alternates_edges_and_starts_loops() {
        let start = t0();
        let mut r = room();
        assert!(!r.is_looping());

        assert_eq!(r.connect(Uuid::new_v4(), "a".into(), start), Side::Left);
        assert_eq!(r.connect(Uuid::new_v4(), "b".into(), start), Side::Right);

        assert!(r.is_looping());
        assert_eq!(r.players()[0].x, 0.05);
        assert_eq!(r.players()[1].x, 0.95);
        assert_eq!(r.players()[1].y, 0.5);
        assert_eq!(r.next_broadcast_at(), Some(start));
    }

    #[test]
    fn idle_room_ticks_are_no_ops() {
        let start = t0();
        let mut r = room();
        let before = r.snapshot();

        r.simulation_tick(start + ms(500));
        assert_eq!(r.snapshot(), before);
        assert_eq!(r.next_tick_at(), None);
        assert!(r.broadcast_tick(start + ms(500), 1).is_none());
        assert_eq!(r.next_broadcast_at(), None);
    }

    #[test]
    fn disconnect_halts_and_reconnect_resumes_retained_state() {
        let start = t0();
        let mut r = room();
        let conn = Uuid::new_v4();
        r.connect(conn, "a".into(), start);
        r.scores.award(Side::Left);

        r.simulation_tick(start + ms(100));
        let x_after_first = r.balls[0].x;
        assert!((x_after_first - 0.53).abs() < 1e-9);

        assert!(r.disconnect(conn));
        assert!(r.players().is_empty());
        assert!(!r.is_looping());

        // The tick that was already scheduled still fires, and does nothing.
        r.simulation_tick(start + ms(200));
        assert_eq!(r.balls[0].x, x_after_first);
        assert_eq!(r.next_tick_at(), None);

        // After a long idle period the first delta is measured from the restart.
        let restart = start + Duration::from_secs(10);
        r.connect(Uuid::new_v4(), "b".into(), restart);
        r.simulation_tick(restart + ms(100));
        assert!((r.balls[0].x - 0.56).abs() < 1e-9);
        assert_eq!(r.scores().get(Side::Left), 1);
    }

    #[test]
    fn disconnect_unknown_connection_changes_nothing() {
        let mut r = room();
        r.connect(Uuid::new_v4(), "a".into(), t0());
        assert!(!r.disconnect(Uuid::new_v4()));
        assert_eq!(r.players().len(), 1);
        assert!(r.is_looping());
    }

    #[test]
    fn paddle_update_stores_top_from_center() {
        let mut r = room();
        let conn = Uuid::new_v4();
        r.connect(conn, "a".into(), t0());

        assert!(r.move_paddle(conn, 0.5));
        assert!((r.players()[0].y - 0.4).abs() < 1e-12);

        assert!(!r.move_paddle(Uuid::new_v4(), 0.3));
        assert!(!r.move_paddle(conn, f64::NAN));
        assert!((r.players()[0].y - 0.4).abs() < 1e-12);
    }

    #[test]
    fn paddle_stays_on_the_court() {
        let mut r = room();
        let conn = Uuid::new_v4();
        r.connect(conn, "a".into(), t0());

        assert!(r.move_paddle(conn, 1.5));
        assert!((r.players()[0].y - 0.8).abs() < 1e-12);

        assert!(r.move_paddle(conn, 0.95));
        assert!((r.players()[0].y - 0.8).abs() < 1e-12);

        assert!(r.move_paddle(conn, -1.0));
        assert_eq!(r.players()[0].y, 0.0);
    }

    #[test]
    fn network_fps_accepts_only_usable_rates() {
        let start = t0();
        let mut r = room();

        let update = r.apply(RoomEvent::SetNetworkFps { fps: Some(30.0) }, start);
        assert!(matches!(update, Some(RoomBroadcast::NetworkFps { fps }) if fps == 30.0));
        assert_eq!(r.network_fps(), 30.0);

        for fps in [None, Some(0.0), Some(-10.0), Some(f64::INFINITY)] {
            assert!(r.apply(RoomEvent::SetNetworkFps { fps }, start).is_none());
        }
        assert_eq!(r.network_fps(), 30.0);
    }

    #[test]
    fn snap_is_broadcast_once_after_a_point() {
        let start = t0();
        let mut r = room();
        r.connect(Uuid::new_v4(), "a".into(), start);
        r.balls[0].x = 0.001;
        r.balls[0].vx = -0.3;

        r.simulation_tick(start + ms(20));
        assert_eq!(r.scores().get(Side::Right), 1);

        let (_, first, _) = snapshot_of(r.broadcast_tick(start + ms(20), 7));
        assert!(first.balls[0].snap);
        assert_eq!(first.balls[0].x, 0.5);

        let (_, second, _) = snapshot_of(r.broadcast_tick(start + ms(70), 8));
        assert!(!second.balls[0].snap);
    }

    #[test]
    fn fixed_timestep_ignores_wall_clock() {
        let start = t0();
        let mut r = Room::new(&RoomSettings {
            game_fps: 10.0,
            fixed_timestep: true,
            ..RoomSettings::default()
        });
        r.connect(Uuid::new_v4(), "a".into(), start);

        r.simulation_tick(start + Duration::from_secs(3));
        assert!((r.balls[0].x - 0.53).abs() < 1e-9);
    }

    #[test]
    fn codec_switch_applies_to_next_broadcast() {
        let start = t0();
        let mut r = room();
        r.connect(Uuid::new_v4(), "a".into(), start);
        r.apply(RoomEvent::SetCodec { codec: Codec::Json }, start);

        let (time, state, codec) = snapshot_of(r.broadcast_tick(start, 1234));
        assert_eq!(codec, Codec::Json);
        assert_eq!(time, 1234);
        assert_eq!(state.players.len(), 1);
        assert_eq!(state.scores.len(), 2);
    }

    #[test]
    fn extreme_rates_stay_schedulable() {
        assert_eq!(period(1e-300), MAX_PERIOD);
        assert_eq!(period(1e9), MIN_PERIOD);
        assert_eq!(period(20.0), ms(50));
    }

    fn spawn_room(
        settings: RoomSettings,
    ) -> (mpsc::Sender<RoomEvent>, broadcast::Receiver<RoomBroadcast>) {
        let (events_tx, events_rx) = mpsc::channel(16);
        let (updates_tx, updates_rx) = broadcast::channel(64);
        tokio::spawn(room_task(
            Room::new(&settings),
            events_rx,
            updates_tx,
            Arc::new(FixedClock(42)),
        ));
        (events_tx, updates_rx)
    }

    async fn next_snapshot(rx: &mut broadcast::Receiver<RoomBroadcast>) -> RoomSnapshot {
        loop {
            match rx.recv().await.expect("room update") {
                RoomBroadcast::Snapshot { time, state, .. } => {
                    assert_eq!(time, 42);
                    return state;
                }
                RoomBroadcast::NetworkFps { .. } => continue,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn task_broadcasts_on_connect_and_follows_rate_changes() {
        let (events_tx, mut updates_rx) = spawn_room(RoomSettings::default());
        events_tx
            .send(RoomEvent::Connect {
                conn_id: Uuid::new_v4(),
                player_id: "a".into(),
            })
            .await
            .expect("send");

        let first = next_snapshot(&mut updates_rx).await;
        assert_eq!(first.players.len(), 1);

        events_tx
            .send(RoomEvent::SetNetworkFps { fps: Some(10.0) })
            .await
            .expect("send");
        loop {
            if let RoomBroadcast::NetworkFps { fps } = updates_rx.recv().await.expect("update") {
                assert_eq!(fps, 10.0);
                break;
            }
        }

        // Once the old deadline has passed the new period applies.
        next_snapshot(&mut updates_rx).await;
        let a = Instant::now();
        next_snapshot(&mut updates_rx).await;
        let gap = Instant::now() - a;
        assert!(gap >= ms(99) && gap <= ms(102), "gap {gap:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn task_goes_quiet_when_room_empties_and_resumes_on_reconnect() {
        let (events_tx, mut updates_rx) = spawn_room(RoomSettings::default());
        let conn = Uuid::new_v4();
        events_tx
            .send(RoomEvent::Connect {
                conn_id: conn,
                player_id: "a".into(),
            })
            .await
            .expect("send");
        next_snapshot(&mut updates_rx).await;

        events_tx
            .send(RoomEvent::Disconnect { conn_id: conn })
            .await
            .expect("send");
        tokio::task::yield_now().await;
        while updates_rx.try_recv().is_ok() {}

        let quiet = tokio::time::timeout(Duration::from_secs(2), updates_rx.recv()).await;
        assert!(quiet.is_err(), "room kept broadcasting while empty");

        events_tx
            .send(RoomEvent::Connect {
                conn_id: Uuid::new_v4(),
                player_id: "b".into(),
            })
            .await
            .expect("send");
        let resumed = next_snapshot(&mut updates_rx).await;
        assert_eq!(resumed.players.len(), 1);
        assert_eq!(resumed.players[0].id, "b");
        assert_eq!(resumed.balls.len(), 1);
    }
}
