use crate::interface_adapters::state::AppState;

use axum::extract::{Json, State};
use std::sync::Arc;

#[derive(Debug, serde::Serialize)]
pub struct RoomSummary {
    pub room_id: String,
}

pub async fn list_rooms_handler(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummary>> {
    let rooms = state
        .registry
        .room_ids()
        .await
        .into_iter()
        .map(|room_id| RoomSummary { room_id })
        .collect();
    Json(rooms)
}
