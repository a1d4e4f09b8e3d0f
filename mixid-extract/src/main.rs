//! mixid-extract - Tracklist extraction web service
//!
//! Accepts a DJ mix URL, identifies the tracks in it in the background and
//! streams progress and the resulting tracklist over SSE.

use anyhow::{Context, Result};
use clap::Parser;
use mixid_common::events::EventBus;
use mixid_extract::config::ExtractorConfig;
use mixid_extract::services::JobOrchestrator;
use mixid_extract::AppState;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::RwLock;
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 5000;

/// Command-line arguments for mixid-extract
#[derive(Parser, Debug)]
#[command(name = "mixid-extract")]
#[command(about = "Tracklist extraction web service for DJ mixes")]
#[command(version)]
struct Args {
    /// Port to listen on (falls back to PORT, then 5000)
    #[arg(short, long, env = "MIXID_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Folder for tracklists and archived downloads
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env before clap so env-backed arguments see it
    let dotenv = dotenvy::dotenv();
    let args = Args::parse();

    let toml_config = mixid_common::config::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;
    mixid_common::logging::init_tracing(&toml_config.logging)?;

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    info!("Starting mixid-extract (Tracklist Extractor)");
    info!(
        "Version: {} (git {}, {} build, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TIMESTAMP")
    );

    let output_dir =
        mixid_common::config::resolve_output_dir(args.output_dir.as_deref(), &toml_config);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output folder {}", output_dir.display()))?;
    info!("Output folder: {}", output_dir.display());

    let extractor_config = ExtractorConfig::resolve(&toml_config, output_dir, false)?;
    let workflow = extractor_config.build_workflow()?;

    let event_bus = EventBus::new(1000);
    info!("Event bus initialized (capacity {})", event_bus.capacity());

    let orchestrator = Arc::new(JobOrchestrator::new(
        workflow,
        Arc::new(RwLock::new(HashMap::new())),
        event_bus,
    ));
    let app = mixid_extract::build_router(AppState::new(orchestrator));

    let port = args.port.unwrap_or_else(fallback_port);
    let addr = SocketAddr::new(args.bind, port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// `PORT` as set by hosting platforms, else the default
fn fallback_port() -> u16 {
    match std::env::var("PORT") {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid PORT value '{}'", value);
            DEFAULT_PORT
        }),
        Err(_) => DEFAULT_PORT,
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
