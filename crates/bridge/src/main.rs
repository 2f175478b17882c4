// Stdio-to-HTTP bridge binary: lets a stdio-only MCP caller reach a
// Toolgate HTTP server.

use anyhow::Result;
use clap::Parser;

mod bridge;

use bridge::Bridge;

#[derive(Parser, Debug)]
#[command(name = "toolgate-bridge")]
#[command(about = "MCP stdio to HTTP bridge for Toolgate", long_about = None)]
struct Args {
    /// Base URL of the remote HTTP server
    #[arg(long, env = "SERVER_URL", default_value = "http://localhost:8008")]
    server_url: String,

    /// API key sent as X-API-Key on forwarded requests
    #[arg(long, env = "API_KEY")]
    api_key: Option<String>,

    /// Command used to start the HTTP server when it is not running
    #[arg(long, env = "TOOLGATE_SERVER_CMD", default_value = "toolgate-server")]
    server_cmd: String,
}

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

    let args = Args::parse();
    tracing::info!(server_url = %args.server_url, "Toolgate HTTP bridge starting");

    let bridge = Bridge::new(args.server_url, args.api_key, args.server_cmd);
    bridge.run().await
}
