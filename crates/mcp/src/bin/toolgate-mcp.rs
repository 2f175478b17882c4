// Standalone MCP stdio server binary.

use anyhow::{bail, Result};
use std::sync::Arc;
use toolgate_core::providers::builtin_providers;
use toolgate_core::{ApiKeys, Dispatcher, Registry};
use toolgate_mcp::StdioServer;

#[tokio::main]
async fn main() -> Result<()> {
    // Stdout is the JSON-RPC channel; all diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("TOOLGATE_LOG")
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::info!("Toolgate MCP server starting");

    // Optional startup authentication: an invalid key is fatal, an absent
    // key runs anonymously with a warning.
    let api_keys = ApiKeys::from_env();
    match std::env::var("API_KEY").ok().filter(|k| !k.is_empty()) {
        Some(key) => match api_keys.validate(&key) {
            Some(client) => tracing::info!(client = %client, "authenticated MCP client"),
            None => bail!("invalid API key provided"),
        },
        None => {
            tracing::warn!("no API key provided - running without authentication");
        }
    }

    let registry = Arc::new(Registry::load_all(builtin_providers())?);
    tracing::info!(providers = registry.providers().len(), "registry loaded");

    let server = StdioServer::new(Dispatcher::new(registry));
    server.run().await
}
