// Use cases layer: room workflows for the pong server.

pub mod registry;
pub mod room;
pub mod types;

pub use registry::{RoomHandle, RoomIdError, RoomRegistry, RoomSettings};
pub use room::{Room, room_task};
pub use types::{RoomBroadcast, RoomEvent};
