use pong_client::ClientConfig;

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

#[tokio::main]
async fn main() {
    init_runtime();

    let config = ClientConfig::from_env();
    tracing::info!(
        server_url = %config.server_url,
        room = %config.room,
        interpolate = config.interpolate,
        follow_ball = config.follow_ball,
        "starting client"
    );

    if let Err(e) = pong_client::run(config).await {
        tracing::error!(error = %e, "client exited with error");
        std::process::exit(1);
    }
}
