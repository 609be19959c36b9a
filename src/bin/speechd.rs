//! speechd — speech-synthesis service daemon.

use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsreel::config::SpeechConfig;
use newsreel::media::MediaToolkit;
use newsreel::providers::{CommandSpeechEngine, SpeechChain};
use newsreel::server::speech;

/// Speech-synthesis service daemon.
#[derive(Parser)]
#[command(name = "speechd")]
#[command(version = newsreel::PKG_VERSION)]
#[command(about = "Newsreel speech-synthesis service")]
struct Args {
    /// Address to bind to.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8002)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing("speechd");

    let config = SpeechConfig::from_env()?;
    info!(
        engine = %config.tts_command,
        sample_rate = config.sample_rate,
        "starting speechd"
    );

    let engine = CommandSpeechEngine::new(config.tts_command.clone(), config.voices_dir.clone());
    let chain = SpeechChain::new(Arc::new(engine), None);
    let toolkit = MediaToolkit::new(config.ffmpeg_bin.clone(), config.ffprobe_bin.clone());

    if !toolkit.available().await {
        warn!("ffmpeg not found; audio post-processing and probing will fail");
    }

    let state = speech::SpeechState::new(config, chain, toolkit)?;
    if state.check_readiness().await {
        info!("speech engine ready");
    } else {
        warn!("speech engine unavailable; serving 503 on mutating endpoints");
    }

    let app = speech::router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("speechd listening on http://{addr}");

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
