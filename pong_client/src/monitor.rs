// Round-trip and bandwidth measurement for the receiving side.

use std::time::Duration;
use tokio::time::Instant;

/// Single in-flight ping: each ping overwrites the measurement window.
#[derive(Debug, Default)]
pub struct RttMonitor {
    last_ping: Option<Instant>,
    rtt: Option<Duration>,
}

impl RttMonitor {
    pub fn on_ping_sent(&mut self, now: Instant) {
        self.last_ping = Some(now);
    }

    /// Records a reply; a pong with no ping on record is ignored.
    pub fn on_pong(&mut self, now: Instant) -> Option<Duration> {
        let sent = self.last_ping?;
        let rtt = now.saturating_duration_since(sent);
        self.rtt = Some(rtt);
        Some(rtt)
    }

    pub fn rtt(&self) -> Option<Duration> {
        self.rtt
    }
}

/// Bytes of snapshot payload received per wall-clock second.
#[derive(Debug, Default)]
pub struct BandwidthMonitor {
    second: Option<u64>,
    accumulating: u64,
    current: u64,
}

impl BandwidthMonitor {
    /// Publishes the accumulated count when the wall-clock second has changed.
    pub fn roll(&mut self, now_epoch_ms: u64) {
        let second = now_epoch_ms / 1000;
        match self.second {
            Some(s) if s == second => {}
            Some(_) => {
                self.second = Some(second);
                self.current = std::mem::take(&mut self.accumulating);
            }
            None => self.second = Some(second),
        }
    }

    pub fn record(&mut self, payload_len: usize) {
        self.accumulating = self.accumulating.saturating_add(payload_len as u64);
    }

    /// Total for the last completed second.
    pub fn current(&self) -> u64 {
        self.current
    }
}
