use crate::domain::Clock;
use crate::use_cases::RoomRegistry;
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    // Room joined when `?room=` is absent.
    pub default_room_id: Arc<str>,
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
