// Framework bootstrap for the pong server runtime.

use crate::frameworks::config;
use crate::interface_adapters::net::{list_rooms_handler, ws_handler};
use crate::interface_adapters::state::{AppState, SystemClock};
use crate::use_cases::{RoomRegistry, RoomSettings};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/rooms", get(list_rooms_handler))
        .with_state(state)
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    run_with_settings(listener, config::room_settings(), config::default_room_id()).await
}

pub async fn run_with_settings(
    listener: tokio::net::TcpListener,
    settings: RoomSettings,
    default_room_id: String,
) -> Result<()> {
    let address = listener.local_addr()?;
    tracing::info!(
        game_fps = settings.game_fps,
        network_fps = settings.network_fps,
        codec = %settings.codec,
        fixed_timestep = settings.fixed_timestep,
        default_room_id = %default_room_id,
        "room settings"
    );

    let state = Arc::new(AppState {
        registry: Arc::new(RoomRegistry::new(settings, Arc::new(SystemClock))),
        default_room_id: Arc::from(default_room_id.as_str()),
    });
    let app = router(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}
