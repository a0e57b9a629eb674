//! Client session state: everything the runtime learns from the server,
//! kept free of I/O so it can be driven directly in tests.

use crate::interpolation::{EntityKind, InterpolatedEntity, Interpolator, POSITION};
use crate::monitor::{BandwidthMonitor, RttMonitor};
use pong_protocol::{
    Codec, CodecError, ControlMessage, Frame, ServerFrame, Snapshot, decode_server_frame,
};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::Instant;

/// What a single inbound frame turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Pong { rtt: Option<Duration> },
    NetworkFps { fps: Option<f64> },
    Snapshot {
        codec: Codec,
        appeared: Vec<String>,
        vanished: Vec<String>,
    },
    /// Well-formed control traffic the client has no use for.
    Ignored,
}

/// Positions to draw for one render tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderFrame {
    pub players: Vec<InterpolatedEntity>,
    pub balls: Vec<InterpolatedEntity>,
    pub interpolated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub bytes_per_sec: u64,
    pub rtt: Option<Duration>,
    pub left: u32,
    pub right: u32,
}

#[derive(Debug)]
pub struct ClientSession {
    interpolator: Interpolator,
    rtt: RttMonitor,
    bandwidth: BandwidthMonitor,
    interpolate: bool,
    // Entity ids currently on screen.
    players: BTreeSet<String>,
    balls: BTreeSet<String>,
    left: u32,
    right: u32,
    codec: Option<Codec>,
}

impl ClientSession {
    pub fn new(network_fps: f64, interpolate: bool) -> Self {
        Self {
            interpolator: Interpolator::new(network_fps),
            rtt: RttMonitor::default(),
            bandwidth: BandwidthMonitor::default(),
            interpolate,
            players: BTreeSet::new(),
            balls: BTreeSet::new(),
            left: 0,
            right: 0,
            codec: None,
        }
    }

    pub fn on_ping_sent(&mut self, now: Instant) {
        self.rtt.on_ping_sent(now);
    }

    /// Routes one frame from the server. Undecodable frames leave the
    /// session untouched apart from the bandwidth window roll.
    pub fn handle_frame(
        &mut self,
        frame: &Frame,
        now: Instant,
        now_epoch_ms: u64,
    ) -> Result<Inbound, CodecError> {
        let decoded = decode_server_frame(frame);
        if let Ok(ServerFrame::Pong) = decoded {
            return Ok(Inbound::Pong {
                rtt: self.rtt.on_pong(now),
            });
        }

        self.bandwidth.roll(now_epoch_ms);
        match decoded? {
            ServerFrame::Pong => Ok(Inbound::Ignored),
            ServerFrame::Control(ControlMessage::NetworkFps { fps }) => {
                let applied = fps.filter(|fps| self.interpolator.set_network_fps(*fps));
                Ok(Inbound::NetworkFps { fps: applied })
            }
            ServerFrame::Control(ControlMessage::Serialize { .. }) => Ok(Inbound::Ignored),
            ServerFrame::Snapshot { snapshot, codec } => {
                self.bandwidth.record(frame.wire_len());
                self.codec = Some(codec);
                let (appeared, vanished) = self.track_entities(&snapshot);
                self.update_scores(&snapshot);
                self.interpolator.add_snapshot(snapshot, now_epoch_ms);
                Ok(Inbound::Snapshot {
                    codec,
                    appeared,
                    vanished,
                })
            }
        }
    }

    fn track_entities(&mut self, snapshot: &Snapshot) -> (Vec<String>, Vec<String>) {
        let players: BTreeSet<String> = snapshot.state.players.iter().map(|p| p.id.clone()).collect();
        let balls: BTreeSet<String> = snapshot.state.balls.iter().map(|b| b.id.clone()).collect();

        let appeared = players
            .difference(&self.players)
            .chain(balls.difference(&self.balls))
            .cloned()
            .collect();
        let vanished = self
            .players
            .difference(&players)
            .chain(self.balls.difference(&balls))
            .cloned()
            .collect();

        self.players = players;
        self.balls = balls;
        (appeared, vanished)
    }

    fn update_scores(&mut self, snapshot: &Snapshot) {
        if let Some(left) = snapshot.score("left") {
            self.left = left;
        }
        if let Some(right) = snapshot.score("right") {
            self.right = right;
        }
    }

    /// Interpolated positions when enabled and enough history exists,
    /// otherwise the latest raw snapshot.
    pub fn render(&self, now_epoch_ms: u64) -> RenderFrame {
        if self.interpolate {
            let players = self
                .interpolator
                .calc(&POSITION, EntityKind::Players, now_epoch_ms);
            let balls = self
                .interpolator
                .calc(&POSITION, EntityKind::Balls, now_epoch_ms);
            if let (Some(players), Some(balls)) = (players, balls) {
                return RenderFrame {
                    players: players.entities,
                    balls: balls.entities,
                    interpolated: true,
                };
            }
        }

        let Some(latest) = self.interpolator.vault().get() else {
            return RenderFrame::default();
        };
        RenderFrame {
            players: latest
                .state
                .players
                .iter()
                .map(|p| InterpolatedEntity {
                    id: p.id.clone(),
                    x: p.x,
                    y: p.y,
                })
                .collect(),
            balls: latest
                .state
                .balls
                .iter()
                .map(|b| InterpolatedEntity {
                    id: b.id.clone(),
                    x: b.x,
                    y: b.y,
                })
                .collect(),
            interpolated: false,
        }
    }

    pub fn stats(&self) -> Stats {
        Stats {
            bytes_per_sec: self.bandwidth.current(),
            rtt: self.rtt.rtt(),
            left: self.left,
            right: self.right,
        }
    }

    pub fn codec(&self) -> Option<Codec> {
        self.codec
    }

    pub fn network_fps(&self) -> f64 {
        self.interpolator.network_fps()
    }

    pub fn tracked_players(&self) -> &BTreeSet<String> {
        &self.players
    }

    pub fn tracked_balls(&self) -> &BTreeSet<String> {
        &self.balls
    }
}
