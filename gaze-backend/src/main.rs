//! gaze-backend - data server for the gaze review viewer
//!
//! Serves the session video, gaze points and annotation tables from a local
//! data directory, and writes importance/comment edits back to the summary CSV.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::Parser;
use gaze_backend::{build_router, AppState};
use gaze_common::config::{BackendConfig, ConfigOverrides, TomlConfig};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for gaze-backend
#[derive(Parser, Debug)]
#[command(name = "gaze-backend")]
#[command(about = "Data server for the gaze review viewer")]
#[command(version)]
struct Args {
    /// Port to listen on [default: 5000]
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Address to bind [default: 0.0.0.0]
    #[arg(long, env = "GAZE_BIND")]
    bind: Option<String>,

    /// Base directory; assets are read from <base>/data if it exists, else <base>
    #[arg(short, long, env = "GAZE_BASE_DIR")]
    base_dir: Option<PathBuf>,

    /// Emit permissive CORS headers [default: true]
    #[arg(long, env = "GAZE_CORS_ANY", value_parser = BoolishValueParser::new())]
    cors_any: Option<bool>,

    /// Report gaze decode failures as 200 with an `error` field [default: true]
    #[arg(long, env = "GAZE_ERRORS_AS_OK", value_parser = BoolishValueParser::new())]
    gaze_errors_as_ok: Option<bool>,

    /// TOML config file
    #[arg(short, long, env = "GAZE_CONFIG")]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            port: self.port,
            bind: self.bind.clone(),
            base_dir: self.base_dir.clone(),
            cors_any: self.cors_any,
            gaze_errors_as_ok: self.gaze_errors_as_ok,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gaze_backend=debug,gaze_common=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any filesystem work
    info!(
        "Starting gaze-backend v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let file_config = TomlConfig::load_optional(args.config.as_deref())
        .context("Failed to load config file")?;
    let config = BackendConfig::resolve(args.overrides(), file_config)
        .context("Failed to resolve configuration")?;

    info!("Data root: {}", config.data_root.display());
    if !config.data_root.is_dir() {
        warn!("Data root {} is not a directory; every asset will be missing", config.data_root.display());
    }
    info!("CORS (allow any origin): {}", config.cors_any);

    let addr = config.socket_addr()?;
    let state = AppState::new(config);
    match &state.heic {
        Some(decoder) => info!("HEIC transcoding enabled ({})", decoder.name()),
        None => info!("HEIC transcoding unavailable; HEIC images are served as-is"),
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("gaze-backend listening on http://{}", addr);
    info!("Health check: http://{}/api/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
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
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
