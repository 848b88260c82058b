//! radiovote-server - anonymous per-track voting for a live radio stream
//!
//! Serves the vote REST API on top of an embedded SQLite database.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use radiovote_common::config::{load_optional_config, ConfigOverrides, ServerConfig};
use radiovote_common::db::{init_database_with, PoolSettings, VoteLedger};
use radiovote_server::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for radiovote-server
#[derive(Parser, Debug)]
#[command(name = "radiovote-server")]
#[command(about = "Vote API for the radio web player")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "RADIOVOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind the HTTP listener to
    #[arg(short, long, env = "RADIOVOTE_BIND")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "RADIOVOTE_PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "RADIOVOTE_DATABASE")]
    database: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, env = "RADIOVOTE_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind_address: self.bind.clone(),
            port: self.port,
            database_path: self.database.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_optional_config(args.config.as_deref())
        .context("Failed to load configuration file")?;
    let config = ServerConfig::resolve(&args.overrides(), toml_config.as_ref());

    init_tracing(&config.log_level);

    // Build identification first, before any database work
    info!(
        "Starting radiovote-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if toml_config.is_some() {
        info!("Configuration file loaded");
    }

    info!("Database path: {}", config.database_path.display());
    let pool = init_database_with(
        &config.database_path,
        &PoolSettings {
            max_connections: config.max_connections,
            busy_timeout: config.busy_timeout(),
        },
    )
    .await
    .context("Failed to initialize database")?;

    let state = AppState::new(VoteLedger::new(pool));
    let app = build_router(state);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("radiovote-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "radiovote_server={level},radiovote_common={level},tower_http={level}",
            level = level
        )
        .into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
