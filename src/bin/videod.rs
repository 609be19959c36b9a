//! videod — video-assembly service daemon.

use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsreel::config::VideoConfig;
use newsreel::media::MediaToolkit;
use newsreel::server::video;

/// Video-assembly service daemon.
#[derive(Parser)]
#[command(name = "videod")]
#[command(version = newsreel::PKG_VERSION)]
#[command(about = "Newsreel video-assembly service")]
struct Args {
    /// Address to bind to.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8003)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing("videod");

    let config = VideoConfig::from_env()?;
    info!(
        resolution = %config.resolution(),
        fps = config.fps,
        codec = %config.video_codec,
        "starting videod"
    );

    let toolkit = MediaToolkit::new(config.ffmpeg_bin.clone(), config.ffprobe_bin.clone());
    let state = video::VideoState::new(config, toolkit)?;
    if state.check_readiness().await {
        info!("ffmpeg available");
    } else {
        warn!("ffmpeg unavailable; serving 503 on mutating endpoints");
    }

    let app = video::router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("videod listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn init_tracing(service: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{service}=info,newsreel=info,tower_http=info").into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json") {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
