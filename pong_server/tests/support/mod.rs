// One shared server per test binary, bound to an ephemeral port.
#![allow(dead_code)]

use futures::StreamExt;
use pong_protocol::{Frame, ServerFrame, decode_server_frame};
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

static SERVER_URL: OnceLock<String> = OnceLock::new();
static SERVER_READY: OnceLock<()> = OnceLock::new();

pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Boots the server once and returns its `http://host:port` base URL.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);
        // The server outlives individual `#[tokio::test]` runtimes on its own thread.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("http://{}", addr));
                pong_server::run(listener).await.expect("server failed");
            });
        });
        wait_for_server_url_and_readiness(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_URL.set(base_url.clone());

    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}

pub fn ws_url(room: &str) -> String {
    let base = ensure_server().replacen("http://", "ws://", 1);
    format!("{base}/ws?room={room}")
}

pub fn unique_room(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

pub async fn connect(room: &str) -> Ws {
    let (ws, _) = connect_async(ws_url(room)).await.expect("websocket connect");
    ws
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

/// Next decodable server frame, failing the test after `RECV_TIMEOUT`.
pub async fn next_frame(ws: &mut Ws) -> ServerFrame {
    tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            let msg = ws
                .next()
                .await
                .expect("stream ended")
                .expect("websocket error");
            if let Some(frame) = to_frame(msg) {
                return decode_server_frame(&frame).expect("decodable server frame");
            }
        }
    })
    .await
    .expect("timed out waiting for a server frame")
}

/// Reads frames until `pick` returns a value.
pub async fn wait_for<T>(ws: &mut Ws, mut pick: impl FnMut(ServerFrame) -> Option<T>) -> T {
    tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            if let Some(found) = pick(next_frame(ws).await) {
                return found;
            }
        }
    })
    .await
    .expect("timed out waiting for the expected frame")
}
