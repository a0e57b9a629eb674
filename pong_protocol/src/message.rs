// Routing of raw frames into typed messages for each direction.

use crate::codec::{Codec, byte};
use crate::control::{ControlMessage, PING, PONG, PaddleUpdate};
use crate::error::CodecError;
use crate::frame::Frame;
use crate::snapshot::Snapshot;

/// Messages a server accepts from an endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientFrame {
    Ping,
    Control(ControlMessage),
    Paddle(PaddleUpdate),
}

/// Messages an endpoint accepts from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerFrame {
    Pong,
    Control(ControlMessage),
    Snapshot { snapshot: Snapshot, codec: Codec },
}

pub fn decode_client_frame(frame: &Frame) -> Result<ClientFrame, CodecError> {
    match frame {
        Frame::Text(text) if text == PING => Ok(ClientFrame::Ping),
        Frame::Text(text) if text.starts_with('{') => {
            Ok(ClientFrame::Control(serde_json::from_str(text)?))
        }
        Frame::Text(_) => Err(CodecError::UnknownFormat),
        Frame::Binary(bytes) => byte::decode_paddle_update(bytes).map(ClientFrame::Paddle),
    }
}

pub fn decode_server_frame(frame: &Frame) -> Result<ServerFrame, CodecError> {
    match frame {
        Frame::Text(text) if text == PONG => Ok(ServerFrame::Pong),
        Frame::Text(text) if text.starts_with('{') => {
            // Parse once, then branch on `type` before treating the text as a snapshot.
            let value: serde_json::Value = serde_json::from_str(text)?;
            if value.get("type").is_some() {
                Ok(ServerFrame::Control(serde_json::from_value(value)?))
            } else {
                Ok(ServerFrame::Snapshot {
                    snapshot: serde_json::from_value(value)?,
                    codec: Codec::Json,
                })
            }
        }
        Frame::Text(_) => Err(CodecError::UnknownFormat),
        Frame::Binary(_) => {
            let codec = Codec::sniff(frame).ok_or(CodecError::UnknownFormat)?;
            Ok(ServerFrame::Snapshot {
                snapshot: codec.decode(frame)?,
                codec,
            })
        }
    }
}

pub fn ping_frame() -> Frame {
    Frame::Text(PING.to_string())
}

pub fn pong_frame() -> Frame {
    Frame::Text(PONG.to_string())
}

pub fn control_frame(msg: &ControlMessage) -> Result<Frame, CodecError> {
    Ok(Frame::Text(msg.to_json()?))
}

pub fn paddle_frame(update: PaddleUpdate) -> Frame {
    Frame::Binary(byte::encode_paddle_update(update))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::sample_snapshot;

    #[test]
    fn client_ping_control_and_paddle() {
        assert_eq!(
            decode_client_frame(&ping_frame()).expect("ping"),
            ClientFrame::Ping
        );

        let txt = r#"{"type":"serialize","method":"json"}"#;
        assert_eq!(
            decode_client_frame(&Frame::Text(txt.into())).expect("control"),
            ClientFrame::Control(ControlMessage::Serialize {
                method: Codec::Json
            })
        );

        let paddle = paddle_frame(PaddleUpdate { y: 0.5 });
        assert_eq!(
            decode_client_frame(&paddle).expect("paddle"),
            ClientFrame::Paddle(PaddleUpdate { y: 0.5 })
        );
    }

    #[test]
    fn client_garbage_is_an_error() {
        assert!(decode_client_frame(&Frame::Text("hello".into())).is_err());
        assert!(decode_client_frame(&Frame::Text("{not json".into())).is_err());
        assert!(decode_client_frame(&Frame::Text(r#"{"type":"warp"}"#.into())).is_err());
        assert!(decode_client_frame(&Frame::Binary(vec![1, 2, 3, 4, 5])).is_err());
    }

    #[test]
    fn server_text_branches_on_type_field() {
        let control = control_frame(&ControlMessage::network_fps(15.0)).expect("frame");
        assert_eq!(
            decode_server_frame(&control).expect("control"),
            ServerFrame::Control(ControlMessage::NetworkFps { fps: Some(15.0) })
        );

        let snapshot = sample_snapshot();
        let json = Codec::Json.encode(&snapshot).expect("encode");
        match decode_server_frame(&json).expect("snapshot") {
            ServerFrame::Snapshot { snapshot: got, codec } => {
                assert_eq!(codec, Codec::Json);
                assert_eq!(got, snapshot);
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn server_unknown_control_type_is_an_error() {
        let frame = Frame::Text(r#"{"type":"confetti","amount":3}"#.into());
        assert!(decode_server_frame(&frame).is_err());
    }

    #[test]
    fn server_binary_is_sniffed() {
        let snapshot = sample_snapshot();
        for codec in [Codec::Byte, Codec::MsgPack] {
            let frame = codec.encode(&snapshot).expect("encode");
            match decode_server_frame(&frame).expect("decode") {
                ServerFrame::Snapshot { codec: got, .. } => assert_eq!(got, codec),
                other => panic!("expected snapshot, got {other:?}"),
            }
        }
        assert!(decode_server_frame(&Frame::Binary(vec![0xff, 0x00])).is_err());
        assert_eq!(
            decode_server_frame(&pong_frame()).expect("pong"),
            ServerFrame::Pong
        );
    }
}
