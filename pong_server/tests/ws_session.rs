mod support;

use futures::SinkExt;
use pong_protocol::{
    Codec, ControlMessage, PaddleUpdate, ServerFrame, Snapshot, control_frame, paddle_frame,
    ping_frame,
};
use support::{Ws, connect, to_message, unique_room, wait_for};
use tokio_tungstenite::{connect_async, tungstenite};

async fn send(ws: &mut Ws, frame: pong_protocol::Frame) {
    ws.send(to_message(frame)).await.expect("send frame");
}

async fn next_snapshot(ws: &mut Ws) -> (Snapshot, Codec) {
    wait_for(ws, |frame| match frame {
        ServerFrame::Snapshot { snapshot, codec } => Some((snapshot, codec)),
        _ => None,
    })
    .await
}

#[tokio::test]
async fn ping_is_answered_with_pong() {
    let mut ws = connect(&unique_room("ping")).await;
    send(&mut ws, ping_frame()).await;

    wait_for(&mut ws, |frame| matches!(frame, ServerFrame::Pong).then_some(())).await;
}

#[tokio::test]
async fn joining_player_sees_byte_snapshot_with_full_court() {
    let mut ws = connect(&unique_room("join")).await;

    let (snapshot, codec) = next_snapshot(&mut ws).await;
    assert_eq!(codec, Codec::Byte);
    assert_eq!(snapshot.id.len(), 6);
    assert_eq!(snapshot.state.players.len(), 1);
    assert_eq!(snapshot.state.players[0].x, 0.05);
    assert_eq!(snapshot.state.balls.len(), 1);
    assert_eq!(snapshot.state.balls[0].id, "0");
    assert!(snapshot.score("left").is_some());
    assert!(snapshot.score("right").is_some());
}

#[tokio::test]
async fn second_player_takes_the_right_edge() {
    let room = unique_room("edges");
    let mut left = connect(&room).await;
    next_snapshot(&mut left).await;
    let mut right = connect(&room).await;

    let (snapshot, _) = wait_for(&mut right, |frame| match frame {
        ServerFrame::Snapshot { snapshot, codec } if snapshot.state.players.len() == 2 => {
            Some((snapshot, codec))
        }
        _ => None,
    })
    .await;
    let xs: Vec<f64> = snapshot.state.players.iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![0.05, 0.95]);
}

#[tokio::test]
async fn codec_switch_reaches_every_endpoint() {
    let room = unique_room("codec");
    let mut a = connect(&room).await;
    let mut b = connect(&room).await;
    next_snapshot(&mut b).await;

    let switch = ControlMessage::Serialize {
        method: Codec::Json,
    };
    send(&mut a, control_frame(&switch).expect("control frame")).await;

    wait_for(&mut b, |frame| match frame {
        ServerFrame::Snapshot {
            codec: Codec::Json, ..
        } => Some(()),
        _ => None,
    })
    .await;

    let switch = ControlMessage::Serialize {
        method: Codec::MsgPack,
    };
    send(&mut b, control_frame(&switch).expect("control frame")).await;
    wait_for(&mut a, |frame| match frame {
        ServerFrame::Snapshot {
            codec: Codec::MsgPack,
            ..
        } => Some(()),
        _ => None,
    })
    .await;
}

#[tokio::test]
async fn network_fps_is_rebroadcast_to_the_room() {
    let room = unique_room("fps");
    let mut a = connect(&room).await;
    let mut b = connect(&room).await;
    next_snapshot(&mut b).await;

    send(
        &mut a,
        control_frame(&ControlMessage::network_fps(30.0)).expect("control frame"),
    )
    .await;

    let fps = wait_for(&mut b, |frame| match frame {
        ServerFrame::Control(ControlMessage::NetworkFps { fps }) => fps,
        _ => None,
    })
    .await;
    assert_eq!(fps, 30.0);
}

#[tokio::test]
async fn paddle_update_moves_the_senders_paddle() {
    let mut ws = connect(&unique_room("paddle")).await;
    next_snapshot(&mut ws).await;

    send(&mut ws, paddle_frame(PaddleUpdate { y: 0.7 })).await;

    wait_for(&mut ws, |frame| match frame {
        ServerFrame::Snapshot { snapshot, .. }
            if (snapshot.state.players[0].y - 0.6).abs() < 1e-9 =>
        {
            Some(())
        }
        _ => None,
    })
    .await;
}

#[tokio::test]
async fn unreadable_messages_keep_the_connection_open() {
    let mut ws = connect(&unique_room("garbage")).await;

    send(&mut ws, pong_protocol::Frame::Binary(vec![1, 2, 3])).await;
    send(&mut ws, pong_protocol::Frame::Text("hello".into())).await;
    send(
        &mut ws,
        pong_protocol::Frame::Text(r#"{"type":"teleport"}"#.into()),
    )
    .await;
    send(&mut ws, ping_frame()).await;

    wait_for(&mut ws, |frame| matches!(frame, ServerFrame::Pong).then_some(())).await;
}

#[tokio::test]
async fn invalid_room_id_is_rejected() {
    let url = support::ws_url("bad%20room");
    match connect_async(url).await {
        Err(tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), 400);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("invalid room id should not upgrade"),
    }
}

#[tokio::test]
async fn rooms_endpoint_lists_created_rooms() {
    let room = unique_room("listed");
    let mut ws = connect(&room).await;
    next_snapshot(&mut ws).await;

    let base_url = support::ensure_server();
    let rooms: serde_json::Value = reqwest::get(format!("{base_url}/rooms"))
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("json body");

    let listed = rooms
        .as_array()
        .expect("array")
        .iter()
        .any(|r| r["room_id"] == room.as_str());
    assert!(listed, "{room} missing from {rooms}");
}
