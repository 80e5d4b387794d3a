//! Darkroom server binary.

use anyhow::{Context, Result};
use clap::Parser;
use darkroom_core::config::AppConfig;
use darkroom_server::bootstrap::ensure_provisioned_cameras;
use darkroom_server::{AppState, create_router};
use darkroom_storage::ObjectStore;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Darkroom - camera fleet image server
#[derive(Parser, Debug)]
#[command(name = "darkroomd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "DARKROOM_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Darkroom v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %args.config, "loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("no config file found at {}", args.config);
    }

    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with("DARKROOM_") && key != "DARKROOM_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: darkroomd --config /path/to/config.toml\n  \
             2. Environment variables: DARKROOM_SERVER__BIND=0.0.0.0:8080 \
             DARKROOM_AUTH__SECRET=your-signing-secret darkroomd\n\n\
             Set DARKROOM_CONFIG to specify a default config file path."
        );
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("DARKROOM_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // Initialize storage backend
    let storage = darkroom_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage")?;

    // Verify storage connectivity before accepting requests, so the server
    // cannot report healthy over unreachable storage.
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!(backend = storage.backend_name(), "storage backend initialized");

    // Initialize metadata store
    let metadata = darkroom_metadata::from_config(&config.metadata)
        .await
        .context("failed to initialize metadata store")?;
    tracing::info!("metadata store initialized");

    // Provision configured pairing tokens
    let provisioned = ensure_provisioned_cameras(metadata.as_ref(), &config.provision)
        .await
        .context("failed to provision cameras")?;
    if provisioned > 0 {
        tracing::info!(count = provisioned, "provisioned new cameras");
    }

    let bind = config.server.bind.clone();
    let state = AppState::new(config, storage, metadata);
    let app = create_router(state);

    let addr: SocketAddr = bind.parse().context("invalid bind address")?;
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
