use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::{encode_broadcast, frame_to_message, message_to_frame};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids;
use crate::use_cases::{RoomBroadcast, RoomEvent, RoomHandle};

use axum::{
    Error, Json,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::SinkExt;
use pong_protocol::{ClientFrame, ControlMessage, PONG, decode_client_frame};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    RoomClosed,
    FramesClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct RoomQuery {
    #[serde(default)]
    room: Option<String>,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);

pub async fn room_update_serializer(
    mut updates_rx: broadcast::Receiver<RoomBroadcast>,
    frames_tx: broadcast::Sender<Message>,
    latest_tx: watch::Sender<Option<Message>>,
) {
    // Encode each room broadcast once and fan the shared frame out.
    loop {
        match updates_rx.recv().await {
            Ok(update) => {
                let frame = match encode_broadcast(&update) {
                    Ok(frame) => frame,
                    Err(e) => {
                        error!(error = %e, "failed to encode room broadcast");
                        continue;
                    }
                };

                let msg = frame_to_message(frame);
                if matches!(update, RoomBroadcast::Snapshot { .. }) {
                    latest_tx.send_replace(Some(msg.clone()));
                }
                let _ = frames_tx.send(msg);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "room serializer lagged; skipping to latest update");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("room updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_room_serializer(room: &RoomHandle) {
    tokio::spawn(
        room_update_serializer(
            room.updates_tx.subscribe(),
            room.frames_tx.clone(),
            room.latest_tx.clone(),
        )
        .instrument(info_span!("serializer", room_id = %room.room_id)),
    );
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoomQuery>,
) -> impl IntoResponse {
    let room_id = query
        .room
        .unwrap_or_else(|| state.default_room_id.to_string());

    let room = match state
        .registry
        .get_or_create(&room_id, spawn_room_serializer)
        .await
    {
        Ok(room) => room,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, room))
}

async fn handle_socket(socket: WebSocket, room: RoomHandle) {
    let conn_id = ids::new_conn_id();
    let player_id = ids::player_id(conn_id);
    let span = info_span!(
        "conn",
        %conn_id,
        player_id = %player_id,
        room_id = %room.room_id
    );
    serve_connection(socket, room, conn_id, player_id)
        .instrument(span)
        .await;
}

async fn serve_connection(
    mut socket: WebSocket,
    room: RoomHandle,
    conn_id: Uuid,
    player_id: String,
) {
    // Subscribe before joining so the snapshot sent on connect is not missed.
    let frames_rx = room.frames_tx.subscribe();
    let latest_rx = room.latest_tx.subscribe();

    if room
        .events_tx
        .send(RoomEvent::Connect {
            conn_id,
            player_id,
        })
        .await
        .is_err()
    {
        error!("room task unavailable");
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::ERROR,
                reason: "room unavailable".into(),
            })))
            .await;
        return;
    }
    info!("client connected");

    let now = Instant::now() - LOG_THROTTLE;
    let mut ctx = ConnCtx {
        conn_id,
        events_tx: room.events_tx.clone(),
        frames_rx,
        latest_rx,
        lag_recovery_count: 0,
        msgs_in: 0,
        msgs_out: 0,
        bytes_in: 0,
        bytes_out: 0,
        invalid_msgs: 0,
        last_events_full_log: now,
        last_frames_lag_log: now,
        last_invalid_log: now,
    };

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

struct ConnCtx {
    conn_id: Uuid,
    events_tx: mpsc::Sender<RoomEvent>,
    frames_rx: broadcast::Receiver<Message>,
    latest_rx: watch::Receiver<Option<Message>>,
    // Count lag recovery snapshots sent to this client.
    lag_recovery_count: u64,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,

    invalid_msgs: u32,

    last_events_full_log: Instant,
    last_frames_lag_log: Instant,
    last_invalid_log: Instant,
}

enum LoopControl {
    Continue,
    Disconnect,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    loop {
        let control = tokio::select! {
            incoming = socket.recv() => handle_incoming_ws(socket, incoming, ctx).await,
            outgoing = ctx.frames_rx.recv() => match outgoing {
                Ok(msg) => Ok(forward_frame(msg, socket, ctx).await),
                Err(broadcast::error::RecvError::Lagged(n)) => Ok(recover_from_lag(n, socket, ctx).await),
                Err(broadcast::error::RecvError::Closed) => Err(NetError::FramesClosed),
            },
        };

        match control {
            Ok(LoopControl::Continue) => continue,
            Ok(LoopControl::Disconnect) => {}
            Err(e) => fatal = Some(e),
        }

        if let Err(err) = socket.close().await.map_err(NetError::Ws) {
            debug!(error = ?err, "socket close error");
        }
        break;
    }

    if let Err(e) = disconnect_cleanup(ctx).await {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn handle_incoming_ws(
    socket: &mut WebSocket,
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    let msg = match incoming {
        Some(Ok(Message::Close(_))) => return Ok(LoopControl::Disconnect),
        Some(Ok(msg)) => msg,
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            return Ok(LoopControl::Disconnect);
        }
        None => {
            info!("websocket closed");
            return Ok(LoopControl::Disconnect);
        }
    };

    // WebSocket-level ping/pong is handled by the transport.
    let Some(frame) = message_to_frame(&msg) else {
        return Ok(LoopControl::Continue);
    };
    ctx.msgs_in += 1;
    ctx.bytes_in += frame.wire_len() as u64;

    match decode_client_frame(&frame) {
        Ok(ClientFrame::Ping) => {
            // Answered here: RTT pings never touch room state.
            match socket.send(Message::Text(PONG.into())).await {
                Ok(()) => {
                    ctx.msgs_out += 1;
                    ctx.bytes_out += PONG.len() as u64;
                    Ok(LoopControl::Continue)
                }
                Err(err) => {
                    warn!(error = %err, "failed to send pong");
                    Ok(LoopControl::Disconnect)
                }
            }
        }
        Ok(ClientFrame::Control(ControlMessage::NetworkFps { fps })) => {
            forward_event(ctx, RoomEvent::SetNetworkFps { fps })
        }
        Ok(ClientFrame::Control(ControlMessage::Serialize { method })) => {
            forward_event(ctx, RoomEvent::SetCodec { codec: method })
        }
        Ok(ClientFrame::Paddle(update)) => {
            let event = RoomEvent::PaddleMove {
                conn_id: ctx.conn_id,
                center_y: update.y,
            };
            forward_event(ctx, event)
        }
        Err(e) => {
            // Bad input is dropped without a reply; the connection stays up.
            ctx.invalid_msgs += 1;
            if should_log(&mut ctx.last_invalid_log) {
                warn!(
                    bytes = frame.wire_len(),
                    text = frame.is_text(),
                    error = %e,
                    invalid = ctx.invalid_msgs,
                    "dropping unreadable client message"
                );
            }
            Ok(LoopControl::Continue)
        }
    }
}

fn forward_event(ctx: &mut ConnCtx, event: RoomEvent) -> Result<LoopControl, NetError> {
    match ctx.events_tx.try_send(event) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_event)) => {
            if should_log(&mut ctx.last_events_full_log) {
                warn!("room event channel full; dropping client message");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_event)) => Err(NetError::RoomClosed),
    }
}

async fn forward_frame(msg: Message, socket: &mut WebSocket, ctx: &mut ConnCtx) -> LoopControl {
    let len = match &msg {
        Message::Text(text) => text.len(),
        Message::Binary(bytes) => bytes.len(),
        _ => 0,
    };
    match socket.send(msg).await.map_err(NetError::Ws) {
        Ok(()) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send room frame");
            LoopControl::Disconnect
        }
    }
}

async fn recover_from_lag(missed: u64, socket: &mut WebSocket, ctx: &mut ConnCtx) -> LoopControl {
    if should_log(&mut ctx.last_frames_lag_log) {
        warn!(missed, "room frames lagged; sending latest snapshot");
    }

    // Resync strategy: send the latest encoded snapshot.
    let latest = ctx.latest_rx.borrow().clone();
    let Some(latest) = latest else {
        return LoopControl::Continue;
    };

    ctx.lag_recovery_count += 1;
    debug!(count = ctx.lag_recovery_count, "sent lag recovery snapshot");
    forward_frame(latest, socket, ctx).await
}

async fn disconnect_cleanup(ctx: &ConnCtx) -> Result<(), NetError> {
    ctx.events_tx
        .send(RoomEvent::Disconnect {
            conn_id: ctx.conn_id,
        })
        .await
        .map_err(|_| NetError::RoomClosed)?;

    debug!(
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_msgs = ctx.invalid_msgs,
        lag_recovery_count = ctx.lag_recovery_count,
        "connection stats"
    );
    info!("client disconnected");
    Ok(())
}
