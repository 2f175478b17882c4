// Stdio-to-HTTP bridge: speaks JSON-RPC on stdin/stdout and forwards
// tool traffic to a remote Toolgate HTTP server, starting it on demand.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use toolgate_core::{ToolDefinition, ToolResult};
use toolgate_mcp::protocol::{
    CallToolParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, ServerCapabilities, ServerInfo, ToolsCapability, PROTOCOL_VERSION,
};

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Bridge {
    server_url: String,
    api_key: Option<String>,
    server_cmd: String,
    http: reqwest::Client,
    health_retries: u32,
    retry_delay: Duration,
}

impl Bridge {
    pub fn new(server_url: String, api_key: Option<String>, server_cmd: String) -> Self {
        if api_key.is_none() {
            tracing::warn!("no API key configured; guarded remote routes will reject calls");
        }
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            api_key,
            server_cmd,
            http: reqwest::Client::new(),
            health_retries: 10,
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Shrink the health-probe retry budget. Test hook.
    pub fn with_retry_policy(mut self, retries: u32, delay: Duration) -> Self {
        self.health_retries = retries;
        self.retry_delay = delay;
        self
    }

    /// Run the stdio loop until EOF. The spawned remote server, if any,
    /// is left running on shutdown so later bridge instances can reuse it.
    pub async fn run(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        let mut lines = stdin.lines();

        tracing::info!(server_url = %self.server_url, "bridge ready");
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(line).await {
                let serialized = serde_json::to_string(&response)?;
                stdout.write_all(serialized.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }
        tracing::info!("stdin closed; leaving remote server running");
        Ok(())
    }

    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(error = %e, "failed to parse request line");
                return Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()));
            }
        };
        self.handle_request(request).await
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!(method = %request.method, "handling request");
        let id = request.id.clone().unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id).await,
            "tools/list" => self.handle_list_tools(id).await,
            "tools/call" => self.handle_call_tool(id, request.params).await,
            "prompts/list" => {
                JsonRpcResponse::success(id, serde_json::json!({"prompts": []}))
            }
            "resources/list" => {
                JsonRpcResponse::success(id, serde_json::json!({"resources": []}))
            }
            "notifications/initialized" => {
                tracing::info!("client finished initialization");
                return None;
            }
            other => JsonRpcResponse::error(id, JsonRpcError::method_not_found(other)),
        };
        Some(response)
    }

    async fn handle_initialize(&self, id: Value) -> JsonRpcResponse {
        if !self.ensure_server_running().await {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::internal_error("Failed to start HTTP server"),
            );
        }

        JsonRpcResponse::success(
            id,
            InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities {
                    tools: ToolsCapability {
                        list_changed: false,
                    },
                    resources: None,
                },
                server_info: ServerInfo {
                    name: "toolgate-http-bridge".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
            },
        )
    }

    async fn handle_list_tools(&self, id: Value) -> JsonRpcResponse {
        match self.fetch_tools().await {
            Ok(tools) => JsonRpcResponse::success(id, ListToolsResult { tools }),
            Err(e) => {
                tracing::error!(error = %e, "failed to list tools");
                JsonRpcResponse::error(
                    id,
                    JsonRpcError::internal_error(format!("Failed to list tools: {e:#}")),
                )
            }
        }
    }

    async fn handle_call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value).transpose() {
            Ok(Some(params)) => params,
            Ok(None) | Err(_) => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing tool name"))
            }
        };
        let arguments = params.arguments.unwrap_or_else(|| serde_json::json!({}));

        match self.call_remote_tool(&params.name, arguments).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                tracing::error!(tool = %params.name, error = %e, "remote call failed");
                JsonRpcResponse::error(
                    id,
                    JsonRpcError::internal_error(format!("Tool execution failed: {e:#}")),
                )
            }
        }
    }

    /// Fetch the remote catalog and reshape it to the protocol schema
    /// (the REST surface exposes snake_case `input_schema`).
    async fn fetch_tools(&self) -> Result<Vec<ToolDefinition>> {
        let mut request = self.http.get(format!("{}/tools", self.server_url));
        if let Some(key) = &self.api_key {
            request = request.header("X-API-Key", key);
        }

        let catalog: RemoteCatalog = request
            .send()
            .await
            .context("request to remote server failed")?
            .error_for_status()
            .context("remote server rejected the request")?
            .json()
            .await
            .context("failed to decode tool catalog")?;

        Ok(catalog
            .tools
            .into_iter()
            .map(|tool| ToolDefinition {
                name: tool.name,
                description: tool.description,
                input_schema: tool.input_schema,
            })
            .collect())
    }

    async fn call_remote_tool(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        let mut request = self
            .http
            .post(format!("{}/tools/{}", self.server_url, name))
            .json(&arguments);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-Key", key);
        }

        let response = request
            .send()
            .await
            .context("request to remote server failed")?;

        if !response.status().is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("{detail}");
        }

        let executed: RemoteExecution = response
            .json()
            .await
            .context("failed to decode tool result")?;
        Ok(ToolResult::text(executed.result))
    }

    /// Probe the remote health endpoint; spawn the server and poll with a
    /// bounded retry budget when it is not reachable.
    async fn ensure_server_running(&self) -> bool {
        if self.probe_health().await {
            tracing::info!("HTTP server already running");
            return true;
        }

        tracing::info!(cmd = %self.server_cmd, "HTTP server not running, starting it");
        let mut parts = self.server_cmd.split_whitespace();
        let Some(program) = parts.next() else {
            tracing::error!("empty server command");
            return false;
        };

        // Spawn detached: the server is meant to outlive this bridge.
        let spawned = std::process::Command::new(program)
            .args(parts)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn();
        if let Err(e) = spawned {
            tracing::error!(error = %e, "failed to spawn HTTP server");
            return false;
        }

        for attempt in 1..=self.health_retries {
            tokio::time::sleep(self.retry_delay).await;
            if self.probe_health().await {
                tracing::info!(attempt, "HTTP server started successfully");
                return true;
            }
        }

        tracing::error!("HTTP server never became healthy");
        false
    }

    async fn probe_health(&self) -> bool {
        let result = self
            .http
            .get(format!("{}/health", self.server_url))
            .timeout(HEALTH_PROBE_TIMEOUT)
            .send()
            .await;
        matches!(result, Ok(response) if response.status().is_success())
    }
}

#[derive(Debug, Deserialize)]
struct RemoteCatalog {
    tools: Vec<RemoteTool>,
}

#[derive(Debug, Deserialize)]
struct RemoteTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct RemoteExecution {
    result: String,
}
