//! Snapshot vault.
//!
//! Snapshots arrive in network order but are kept ordered by the server time
//! they carry, so late arrivals slot into place instead of corrupting the
//! interpolation window.

use crate::interpolation::{EntityKind, Field, InterpolatedState, interpolate_pair};
use pong_protocol::Snapshot;
use std::collections::VecDeque;

pub const DEFAULT_VAULT_CAPACITY: usize = 120;

#[derive(Debug)]
pub struct Vault {
    history: VecDeque<Snapshot>,
    capacity: usize,
    // Most recently added, which is not necessarily the newest by time.
    latest: Option<Snapshot>,
}

impl Default for Vault {
    fn default() -> Self {
        Self::new(DEFAULT_VAULT_CAPACITY)
    }
}

impl Vault {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity: capacity.max(2),
            latest: None,
        }
    }

    pub fn add(&mut self, snapshot: Snapshot) {
        // Equal times keep arrival order.
        let at = self.history.partition_point(|s| s.time <= snapshot.time);
        self.history.insert(at, snapshot.clone());
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
        self.latest = Some(snapshot);
    }

    /// The most recently added snapshot.
    pub fn get(&self) -> Option<&Snapshot> {
        self.latest.as_ref()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Snapshots in server-time order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.history.iter()
    }

    /// Picks the `(older, newer)` pair around `render_time`: `newer` is the
    /// first snapshot strictly after it. Past either end the outermost pair is
    /// used and the blend weight clamps.
    pub fn bracket(&self, render_time: f64) -> Option<(&Snapshot, &Snapshot)> {
        let len = self.history.len();
        if len < 2 {
            return None;
        }
        let newer = self
            .history
            .partition_point(|s| s.time as f64 <= render_time)
            .clamp(1, len - 1);
        Some((&self.history[newer - 1], &self.history[newer]))
    }

    /// Blends `fields` of every `kind` entity between the snapshots around
    /// `render_time`. `None` with fewer than two snapshots buffered.
    pub fn interpolate(
        &self,
        fields: &[Field],
        kind: EntityKind,
        render_time: f64,
    ) -> Option<InterpolatedState> {
        let (older, newer) = self.bracket(render_time)?;
        Some(interpolate_pair(older, newer, fields, kind, render_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pong_protocol::SnapshotState;

    fn at(time: u64) -> Snapshot {
        Snapshot {
            id: format!("s{time}"),
            time,
            state: SnapshotState::default(),
        }
    }

    fn times(vault: &Vault) -> Vec<u64> {
        vault.iter().map(|s| s.time).collect()
    }

    #[test]
    fn keeps_time_order_regardless_of_arrival() {
        let mut vault = Vault::default();
        for t in [100, 300, 200, 50] {
            vault.add(at(t));
        }
        assert_eq!(times(&vault), vec![50, 100, 200, 300]);
        // `get` follows arrival, not time.
        assert_eq!(vault.get().map(|s| s.time), Some(50));
    }

    #[test]
    fn evicts_oldest_by_time_at_capacity() {
        let mut vault = Vault::new(3);
        for t in [10, 20, 30] {
            vault.add(at(t));
        }
        vault.add(at(5));
        assert_eq!(times(&vault), vec![10, 20, 30]);
        vault.add(at(40));
        assert_eq!(times(&vault), vec![20, 30, 40]);
        assert_eq!(vault.len(), 3);
    }

    #[test]
    fn bracket_needs_two_snapshots() {
        let mut vault = Vault::default();
        assert!(vault.bracket(0.0).is_none());
        vault.add(at(100));
        assert!(vault.bracket(100.0).is_none());
        assert!(vault.interpolate(&[Field::X], EntityKind::Balls, 100.0).is_none());
    }

    #[test]
    fn bracket_picks_pair_around_render_time() {
        let mut vault = Vault::default();
        for t in [100, 200, 300] {
            vault.add(at(t));
        }
        let pair = |r: f64| {
            vault
                .bracket(r)
                .map(|(a, b)| (a.time, b.time))
                .expect("pair")
        };
        assert_eq!(pair(150.0), (100, 200));
        assert_eq!(pair(200.0), (200, 300));
        assert_eq!(pair(250.0), (200, 300));
        assert_eq!(pair(999.0), (200, 300));
        assert_eq!(pair(10.0), (100, 200));
    }
}
