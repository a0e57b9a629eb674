use uuid::Uuid;

const PLAYER_ID_LEN: usize = 8;
const SNAPSHOT_ID_LEN: usize = 6;

fn short(id: Uuid, len: usize) -> String {
    let mut s = id.simple().to_string();
    s.truncate(len);
    s
}

/// Returns a fresh identity for one WebSocket connection.
pub fn new_conn_id() -> Uuid {
    Uuid::new_v4()
}

/// Short player id derived from the connection identity.
pub fn player_id(conn_id: Uuid) -> String {
    short(conn_id, PLAYER_ID_LEN)
}

pub fn snapshot_id() -> String {
    short(Uuid::new_v4(), SNAPSHOT_ID_LEN)
}
