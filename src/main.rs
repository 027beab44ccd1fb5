//! Showroom API Server
//!
//! Run with: cargo run --bin showroom
//!
//! # Configuration
//!
//! Read from `--config`, or the first of
//! `~/.config/showroom/config.toml`, `/etc/showroom/config.toml`,
//! `./config.toml`. Environment variables override the file:
//! - `SHOWROOM_DATA_DIR`, `SHOWROOM_API_HOST`, `SHOWROOM_API_PORT`, `SHOWROOM_PUBLIC_URL`
//! - `WEBHOOK_AGENT_URL`: agent webhook (car sync reports failure when unset)
//! - `SHOWROOM_SYNC_FUNCTION_URL`: remote Sync Function instead of the in-process one
//! - `SHOWROOM_OPERATOR_EMAIL`, `SHOWROOM_OPERATOR_KEY`
//! - `SHOWROOM_LOG_LEVEL`, `SHOWROOM_LOG_FORMAT` (`pretty` or `json`)
//! - `RUST_LOG`: full filter, wins over the configured level

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use showroom::api::{serve, AppState};
use showroom::config::{Config, LoggingConfig};

#[derive(Parser)]
#[command(name = "showroom")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Dealership back-office server")]
struct Args {
    /// Config file (default: search the usual locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listening port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the data directory
    #[arg(long)]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {:?}", path))?,
        None => Config::load_default(),
    };

    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(data_dir) = args.data_dir {
        config.storage.data_dir = data_dir;
    }

    init_tracing(&config.logging);

    tracing::info!("Starting Showroom API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {:?}", config.storage.data_path());
    tracing::info!(
        bucket = %config.photos.bucket,
        max_photos = config.photos.max_photos,
        guard = config.auth.enabled,
        "Back-office configured"
    );

    let state = AppState::open(config)
        .await
        .context("opening record store and photo bucket")?;

    serve(state).await.context("running API server")?;

    tracing::info!("Showroom API server stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "showroom={level},tower_http={level}",
            level = logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
