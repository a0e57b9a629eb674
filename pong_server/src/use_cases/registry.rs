// Room registry: creates rooms on first use and hands out their channels.

use super::room::{Room, room_task};
use super::types::{RoomBroadcast, RoomEvent};
use crate::domain::Clock;
use crate::domain::tuning::{DEFAULT_GAME_FPS, DEFAULT_NETWORK_FPS};
use axum::extract::ws::Message;
use pong_protocol::Codec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast, mpsc, watch};
use tracing::{Instrument, info, info_span};

pub const MAX_ROOM_ID_LEN: usize = 64;

/// Shared configuration for spawning rooms.
#[derive(Debug, Clone)]
pub struct RoomSettings {
    /// Capacity for inbound room events.
    pub event_channel_capacity: usize,
    /// Capacity for outbound room broadcasts (raw and encoded).
    pub broadcast_capacity: usize,
    pub game_fps: f64,
    /// Initial broadcast rate; clients may change it per room.
    pub network_fps: f64,
    /// Initial room codec.
    pub codec: Codec,
    pub fixed_timestep: bool,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            event_channel_capacity: 1024,
            broadcast_capacity: 128,
            game_fps: DEFAULT_GAME_FPS,
            network_fps: DEFAULT_NETWORK_FPS,
            codec: Codec::Byte,
            fixed_timestep: false,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RoomIdError {
    Empty,
    TooLong(usize),
    InvalidChar(char),
}

impl fmt::Display for RoomIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomIdError::Empty => f.write_str("room id is required"),
            RoomIdError::TooLong(len) => {
                write!(f, "room id is {len} characters; at most {MAX_ROOM_ID_LEN} allowed")
            }
            RoomIdError::InvalidChar(c) => write!(f, "room id contains invalid character {c:?}"),
        }
    }
}

/// Room ids are 1..=64 characters of `[A-Za-z0-9_-]`.
pub fn validate_room_id(room_id: &str) -> Result<(), RoomIdError> {
    if room_id.is_empty() {
        return Err(RoomIdError::Empty);
    }
    let len = room_id.chars().count();
    if len > MAX_ROOM_ID_LEN {
        return Err(RoomIdError::TooLong(len));
    }
    match room_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        Some(c) => Err(RoomIdError::InvalidChar(c)),
        None => Ok(()),
    }
}

/// Per-room channels.
#[derive(Clone)]
pub struct RoomHandle {
    /// Identifier clients use to target this room.
    pub room_id: Arc<str>,
    /// Sender for events into the room task.
    pub events_tx: mpsc::Sender<RoomEvent>,
    /// Broadcast sender for raw room output.
    pub updates_tx: broadcast::Sender<RoomBroadcast>,
    /// Broadcast sender for encoded frames shared by every connection.
    pub frames_tx: broadcast::Sender<Message>,
    /// Latest encoded snapshot, for lag recovery.
    pub latest_tx: watch::Sender<Option<Message>>,
}

/// Thread-safe registry of live rooms. Rooms are never removed.
pub struct RoomRegistry {
    settings: RoomSettings,
    clock: Arc<dyn Clock>,
    rooms: RwLock<HashMap<String, RoomHandle>>,
}

impl RoomRegistry {
    pub fn new(settings: RoomSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            clock,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    /// Returns the room for `room_id`, creating it and spawning its task if
    /// needed. `on_create` runs once per room, before any caller can send it
    /// events, so encoders subscribe ahead of the first broadcast.
    pub async fn get_or_create(
        &self,
        room_id: &str,
        on_create: impl FnOnce(&RoomHandle),
    ) -> Result<RoomHandle, RoomIdError> {
        validate_room_id(room_id)?;

        if let Some(room) = self.rooms.read().await.get(room_id) {
            return Ok(room.clone());
        }

        let mut rooms = self.rooms.write().await;
        // Another connection may have created it between the two locks.
        if let Some(room) = rooms.get(room_id) {
            return Ok(room.clone());
        }

        let (events_tx, events_rx) = mpsc::channel(self.settings.event_channel_capacity);
        let (updates_tx, _updates_rx) = broadcast::channel(self.settings.broadcast_capacity);
        let (frames_tx, _frames_rx) = broadcast::channel(self.settings.broadcast_capacity);
        let (latest_tx, _latest_rx) = watch::channel(None);

        let room = RoomHandle {
            room_id: Arc::from(room_id),
            events_tx,
            updates_tx: updates_tx.clone(),
            frames_tx,
            latest_tx,
        };
        on_create(&room);

        tokio::spawn(
            room_task(
                Room::new(&self.settings),
                events_rx,
                updates_tx,
                self.clock.clone(),
            )
            .instrument(info_span!("room", room_id = %room_id)),
        );
        info!(room_id = %room_id, "room created");

        rooms.insert(room_id.to_string(), room.clone());
        Ok(room)
    }

    pub async fn room_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rooms.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now_epoch_millis(&self) -> u64 {
            0
        }
    }

    fn registry() -> RoomRegistry {
        RoomRegistry::new(RoomSettings::default(), Arc::new(FixedClock))
    }

    #[test]
    fn validates_room_ids() {
        assert_eq!(validate_room_id("my-new-room"), Ok(()));
        assert_eq!(validate_room_id("Room_42"), Ok(()));
        assert_eq!(validate_room_id(""), Err(RoomIdError::Empty));
        assert_eq!(
            validate_room_id(&"a".repeat(65)),
            Err(RoomIdError::TooLong(65))
        );
        assert_eq!(validate_room_id(&"a".repeat(64)), Ok(()));
        assert_eq!(
            validate_room_id("a b"),
            Err(RoomIdError::InvalidChar(' '))
        );
        assert_eq!(
            validate_room_id("../etc"),
            Err(RoomIdError::InvalidChar('.'))
        );
    }

    #[tokio::test]
    async fn creates_each_room_once() {
        let registry = registry();
        let mut created = 0;

        let a = registry
            .get_or_create("alpha", |_| created += 1)
            .await
            .expect("create");
        let again = registry
            .get_or_create("alpha", |_| created += 1)
            .await
            .expect("lookup");
        registry
            .get_or_create("beta", |_| created += 1)
            .await
            .expect("create");

        assert_eq!(created, 2);
        assert!(a.events_tx.same_channel(&again.events_tx));
        assert_eq!(&*a.room_id, "alpha");
        assert_eq!(registry.room_ids().await, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn rejects_invalid_ids_without_creating() {
        let registry = registry();
        let res = registry.get_or_create("no spaces", |_| {}).await;
        assert!(matches!(res, Err(RoomIdError::InvalidChar(' '))));
        assert!(registry.room_ids().await.is_empty());
    }
}
