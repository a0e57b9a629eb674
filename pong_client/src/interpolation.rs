//! Interpolation.
//!
//! The server broadcasts discrete snapshots at the network rate. The client
//! renders at its own rate, slightly in the past, by blending the two
//! buffered snapshots that bracket the render time.

use crate::vault::Vault;
use pong_protocol::{Snapshot, usable_fps};

/// Snapshots buffered ahead of the render clock, in broadcast periods.
pub const BUFFER_PERIODS: f64 = 3.0;
/// Clock drift (ms) beyond which the server time offset is re-captured.
pub const OFFSET_TOLERANCE_MS: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    X,
    Y,
}

pub const POSITION: [Field; 2] = [Field::X, Field::Y];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Players,
    Balls,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedEntity {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedState {
    /// Blend weight before per-entity snapping, in [0, 1].
    pub weight: f64,
    pub entities: Vec<InterpolatedEntity>,
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

// Entity view shared by players and balls; only balls can snap.
struct Sample<'a> {
    id: &'a str,
    x: f64,
    y: f64,
    snap: bool,
}

fn samples(snapshot: &Snapshot, kind: EntityKind) -> Vec<Sample<'_>> {
    match kind {
        EntityKind::Players => snapshot
            .state
            .players
            .iter()
            .map(|p| Sample {
                id: &p.id,
                x: p.x,
                y: p.y,
                snap: false,
            })
            .collect(),
        EntityKind::Balls => snapshot
            .state
            .balls
            .iter()
            .map(|b| Sample {
                id: &b.id,
                x: b.x,
                y: b.y,
                snap: b.snap,
            })
            .collect(),
    }
}

/// Blends two snapshots. Entities missing from either side are dropped, a
/// ball flagged `snap` in `newer` jumps straight to its new position, and
/// fields not listed in `fields` take the newer value.
pub fn interpolate_pair(
    older: &Snapshot,
    newer: &Snapshot,
    fields: &[Field],
    kind: EntityKind,
    render_time: f64,
) -> InterpolatedState {
    let span = newer.time as f64 - older.time as f64;
    let weight = if span > 0.0 {
        ((render_time - older.time as f64) / span).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let before = samples(older, kind);
    let entities = samples(newer, kind)
        .into_iter()
        .filter_map(|n| {
            let o = before.iter().find(|o| o.id == n.id)?;
            let t = if n.snap { 1.0 } else { weight };
            let blend = |field, a, b| {
                if fields.contains(&field) {
                    lerp(a, b, t)
                } else {
                    b
                }
            };
            Some(InterpolatedEntity {
                id: n.id.to_string(),
                x: blend(Field::X, o.x, n.x),
                y: blend(Field::Y, o.y, n.y),
            })
        })
        .collect();

    InterpolatedState {
        weight,
        entities,
    }
}

/// Render clock plus vault: maps local time onto server time and queries
/// the vault a few broadcast periods in the past.
#[derive(Debug)]
pub struct Interpolator {
    vault: Vault,
    network_fps: f64,
    // local - server, in ms; captured from the first snapshot.
    time_offset: Option<i64>,
}

impl Interpolator {
    pub fn new(network_fps: f64) -> Self {
        Self {
            vault: Vault::default(),
            network_fps,
            time_offset: None,
        }
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn network_fps(&self) -> f64 {
        self.network_fps
    }

    pub fn time_offset(&self) -> Option<i64> {
        self.time_offset
    }

    /// How far behind the server clock the render time trails, in ms.
    pub fn buffer_ms(&self) -> f64 {
        BUFFER_PERIODS * 1000.0 / self.network_fps
    }

    /// Recalibrates the buffer for a new broadcast rate; history is kept.
    pub fn set_network_fps(&mut self, fps: f64) -> bool {
        match usable_fps(Some(fps)) {
            Some(fps) => {
                self.network_fps = fps;
                true
            }
            None => false,
        }
    }

    pub fn add_snapshot(&mut self, snapshot: Snapshot, local_now_ms: u64) {
        let offset = local_now_ms as i64 - snapshot.time as i64;
        match self.time_offset {
            Some(current) if (offset - current).abs() <= OFFSET_TOLERANCE_MS => {}
            _ => self.time_offset = Some(offset),
        }
        self.vault.add(snapshot);
    }

    /// Server-time instant to render at, once a snapshot has been seen.
    pub fn render_time(&self, local_now_ms: u64) -> Option<f64> {
        let offset = self.time_offset?;
        Some(local_now_ms as f64 - offset as f64 - self.buffer_ms())
    }

    pub fn calc(
        &self,
        fields: &[Field],
        kind: EntityKind,
        local_now_ms: u64,
    ) -> Option<InterpolatedState> {
        let render_time = self.render_time(local_now_ms)?;
        self.vault.interpolate(fields, kind, render_time)
    }
}
