use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use toolgate_core::providers::builtin_providers;
use toolgate_core::Registry;

mod api;
mod config;
mod middleware;

use config::{AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "toolgate-server")]
#[command(about = "HTTP/REST surface for the Toolgate tool gateway", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "toolgate.toml")]
    config: PathBuf,

    /// Port to listen on
    #[arg(short, long, env = "TOOLGATE_PORT", default_value = "8008")]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "TOOLGATE_HOST", default_value = "127.0.0.1")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("TOOLGATE_LOG")
                .unwrap_or_else(|_| "toolgate=info,tower_http=debug".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    tracing::info!("Starting Toolgate HTTP server");

    let config = ServerConfig::load(&args.config)?;
    let api_keys = config.api_keys();
    if api_keys.is_empty() {
        tracing::warn!("no API keys configured; every guarded route will be rejected");
    }

    let registry = Arc::new(Registry::load_all(builtin_providers())?);
    tracing::info!(clients = ?registry.names(), "registry loaded");

    let state = AppState::new(registry, api_keys);

    let addr = format!("{}:{}", args.host, args.port);
    api::serve(&addr, state).await
}
