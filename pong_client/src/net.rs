// Headless WebSocket runtime: connects to a room and drives a ClientSession.

use crate::config::{ClientConfig, DEFAULT_NETWORK_FPS};
use crate::error::ClientError;
use crate::session::{ClientSession, Inbound, RenderFrame};

use futures_util::{SinkExt, StreamExt};
use pong_protocol::{
    ControlMessage, Frame, PaddleUpdate, control_frame, paddle_frame, ping_frame,
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

pub const PING_INTERVAL: Duration = Duration::from_millis(50);
pub const RENDER_INTERVAL: Duration = Duration::from_millis(16);
pub const STATS_INTERVAL: Duration = Duration::from_secs(1);
const LOG_THROTTLE: Duration = Duration::from_secs(2);
// Paddle moves smaller than one quantization step are not worth sending.
const PADDLE_EPSILON: f64 = 1e-4;
// Ball side length in normalized court units; snapshots carry the top-left corner.
const BALL_WIDTH: f64 = 0.02;

fn now_epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub fn to_frame(msg: Message) -> Option<Frame> {
    match msg {
        Message::Text(text) => Some(Frame::Text(text.as_str().to_owned())),
        Message::Binary(bytes) => Some(Frame::Binary(bytes.to_vec())),
        _ => None,
    }
}

pub fn to_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::text(text),
        Frame::Binary(bytes) => Message::binary(bytes),
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

/// Requests issued once right after connecting.
pub fn startup_requests(config: &ClientConfig) -> Result<Vec<Frame>, ClientError> {
    let mut frames = Vec::new();
    if let Some(method) = config.request_codec {
        frames.push(control_frame(&ControlMessage::Serialize { method })?);
    }
    if let Some(fps) = config.request_network_fps {
        frames.push(control_frame(&ControlMessage::network_fps(fps))?);
    }
    Ok(frames)
}

/// Paddle center to request so the paddle centers on the first ball, if it moved.
pub fn follow_target(render: &RenderFrame, last_sent: Option<f64>) -> Option<f64> {
    let y = render.balls.first()?.y + BALL_WIDTH / 2.0;
    match last_sent {
        Some(prev) if (prev - y).abs() < PADDLE_EPSILON => None,
        _ => Some(y),
    }
}

pub async fn run(config: ClientConfig) -> Result<(), ClientError> {
    let url = config.room_url()?;
    let (ws, _response) = connect_async(url.as_str()).await?;
    info!(%url, "connected");
    let (mut write, mut read) = ws.split();

    for frame in startup_requests(&config)? {
        write.send(to_message(frame)).await?;
    }

    let mut session = ClientSession::new(DEFAULT_NETWORK_FPS, config.interpolate);
    let mut ping = interval(PING_INTERVAL);
    let mut render = interval(RENDER_INTERVAL);
    render.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stats = interval(STATS_INTERVAL);
    let mut last_paddle: Option<f64> = None;
    let mut last_bad_frame_log = Instant::now() - LOG_THROTTLE;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            incoming = read.next() => {
                let msg = match incoming {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        info!("server closed the connection");
                        return Ok(());
                    }
                };
                let Some(frame) = to_frame(msg) else {
                    continue;
                };
                match session.handle_frame(&frame, Instant::now(), now_epoch_millis()) {
                    Ok(Inbound::Snapshot { codec, appeared, vanished }) => {
                        if !appeared.is_empty() || !vanished.is_empty() {
                            info!(%codec, ?appeared, ?vanished, "entities changed");
                        }
                    }
                    Ok(Inbound::NetworkFps { fps: Some(fps) }) => {
                        info!(fps, "network rate changed; interpolation recalibrated");
                    }
                    Ok(other) => debug!(?other, "frame handled"),
                    Err(e) => {
                        if should_log(&mut last_bad_frame_log) {
                            warn!(error = %e, bytes = frame.wire_len(), "dropping unreadable frame");
                        }
                    }
                }
            }
            _ = ping.tick() => {
                write.send(to_message(ping_frame())).await?;
                session.on_ping_sent(Instant::now());
            }
            _ = render.tick() => {
                let frame = session.render(now_epoch_millis());
                if !config.follow_ball {
                    continue;
                }
                if let Some(y) = follow_target(&frame, last_paddle) {
                    write.send(to_message(paddle_frame(PaddleUpdate { y }))).await?;
                    last_paddle = Some(y);
                }
            }
            _ = stats.tick() => {
                let s = session.stats();
                info!(
                    bytes_per_sec = s.bytes_per_sec,
                    rtt_ms = s.rtt.map(|d| d.as_millis() as u64),
                    left = s.left,
                    right = s.right,
                    players = session.tracked_players().len(),
                    balls = session.tracked_balls().len(),
                    "stats"
                );
            }
            _ = &mut shutdown => {
                info!("shutting down");
                let _ = write.close().await;
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::InterpolatedEntity;
    use pong_protocol::{ClientFrame, Codec, decode_client_frame};

    #[test]
    fn startup_requests_follow_config() {
        assert!(startup_requests(&ClientConfig::default()).expect("frames").is_empty());

        let config = ClientConfig {
            request_codec: Some(Codec::MsgPack),
            request_network_fps: Some(30.0),
            ..ClientConfig::default()
        };
        let frames = startup_requests(&config).expect("frames");
        assert_eq!(
            decode_client_frame(&frames[0]).expect("decode"),
            ClientFrame::Control(ControlMessage::Serialize {
                method: Codec::MsgPack
            })
        );
        assert_eq!(
            decode_client_frame(&frames[1]).expect("decode"),
            ClientFrame::Control(ControlMessage::network_fps(30.0))
        );
    }

    #[test]
    fn follow_target_centers_on_first_ball() {
        let render = RenderFrame {
            balls: vec![InterpolatedEntity {
                id: "0".into(),
                x: 0.5,
                y: 0.3,
            }],
            ..RenderFrame::default()
        };
        let target = follow_target(&render, None).expect("target");
        assert!((target - 0.31).abs() < 1e-12, "{target}");
        assert_eq!(follow_target(&render, Some(target)), None);
        assert_eq!(follow_target(&render, Some(0.6)), Some(target));
        assert_eq!(follow_target(&RenderFrame::default(), None), None);
    }

    #[test]
    fn messages_convert_to_frames() {
        let frame = to_frame(to_message(ping_frame())).expect("frame");
        assert_eq!(frame, ping_frame());
        assert!(to_frame(Message::Ping(Vec::new().into())).is_none());

        let bin = Frame::Binary(vec![0x83, 1]);
        assert_eq!(to_frame(to_message(bin.clone())), Some(bin));
    }
}
