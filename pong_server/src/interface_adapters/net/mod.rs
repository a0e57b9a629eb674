// Network adapter modules split by client sockets vs diagnostic HTTP routes.

pub mod client;
pub mod internal;

pub use client::{spawn_room_serializer, ws_handler};
pub use internal::list_rooms_handler;
