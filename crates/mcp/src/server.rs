// Stdio protocol server: a single-threaded cooperative loop that reads
// one JSON-RPC request per line and writes one response per line. Strictly
// sequential so stdout writes never interleave.

use crate::protocol::*;
use anyhow::Result;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use toolgate_core::Dispatcher;

pub struct StdioServer {
    dispatcher: Dispatcher,
    server_name: String,
}

impl StdioServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            server_name: "toolgate-mcp".to_string(),
        }
    }

    /// Run the loop until stdin reaches EOF. A single bad request never
    /// terminates the loop; only I/O failure on stdin/stdout does.
    pub async fn run(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        let mut lines = stdin.lines();

        tracing::info!("stdio server ready");
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
        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    /// Process one input line. `None` means no response is written
    /// (notifications).
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "failed to parse request line");
                return Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()));
            }
        };

        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(error = %e, "malformed JSON-RPC envelope");
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::invalid_request(),
                ));
            }
        };

        self.handle_request(request).await
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!(method = %request.method, "handling request");

        if request.method == "notifications/initialized" {
            tracing::info!("client finished initialization");
            return None;
        }
        if request.is_notification() {
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize_result()),
            "tools/list" => JsonRpcResponse::success(
                id,
                ListToolsResult {
                    tools: self.dispatcher.list_tools(),
                },
            ),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            "resources/list" => JsonRpcResponse::success(
                id,
                ListResourcesResult {
                    resources: self.dispatcher.list_resources(),
                },
            ),
            "resources/read" => self.handle_read_resource(id, request.params),
            other => JsonRpcResponse::error(id, JsonRpcError::method_not_found(other)),
        };
        Some(response)
    }

    fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
                resources: Some(ResourcesCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: self.server_name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
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
        let result = self.dispatcher.call_tool(&params.name, arguments).await;
        JsonRpcResponse::success(id, result)
    }

    fn handle_read_resource(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: ReadResourceParams = match params.map(serde_json::from_value).transpose() {
            Ok(Some(params)) => params,
            Ok(None) | Err(_) => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing resource URI"))
            }
        };

        match self.dispatcher.read_resource(&params.uri) {
            Ok(text) => JsonRpcResponse::success(
                id,
                ReadResourceResult {
                    contents: vec![ResourceContents {
                        uri: params.uri,
                        mime_type: "text/plain".to_string(),
                        text,
                    }],
                },
            ),
            Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result as AnyResult};
    use std::sync::Arc;
    use toolgate_core::{
        ClientConfig, Registry, ToolDefinition, ToolProvider, ToolResult, ToolSet,
    };

    struct EchoProvider {
        config: ClientConfig,
        tools: ToolSet,
    }

    impl EchoProvider {
        fn new() -> Self {
            let mut tools = ToolSet::new();
            tools.register(ToolDefinition {
                name: "echo".to_string(),
                description: "Echo the message argument".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {"message": {"type": "string"}},
                    "required": ["message"]
                }),
            });
            tools.register(ToolDefinition {
                name: "explode".to_string(),
                description: "Always fails".to_string(),
                input_schema: serde_json::json!({"type": "object"}),
            });
            Self {
                config: ClientConfig::new("echo", "Echo tools"),
                tools,
            }
        }
    }

    #[async_trait::async_trait]
    impl ToolProvider for EchoProvider {
        fn config(&self) -> &ClientConfig {
            &self.config
        }

        fn tools(&self) -> &[ToolDefinition] {
            self.tools.as_slice()
        }

        async fn execute_tool(
            &self,
            name: &str,
            arguments: serde_json::Value,
        ) -> AnyResult<ToolResult> {
            match name {
                "echo" => {
                    let message = arguments["message"].as_str().unwrap_or("").to_string();
                    Ok(ToolResult::text(message))
                }
                _ => bail!("kaboom"),
            }
        }
    }

    fn server() -> StdioServer {
        let registry = Registry::with_providers(vec![Arc::new(EchoProvider::new()) as _]);
        StdioServer::new(Dispatcher::new(Arc::new(registry)))
    }

    #[tokio::test]
    async fn malformed_json_yields_parse_error_and_loop_survives() {
        let server = server();

        let response = server.handle_line("not json").await.unwrap();
        assert_eq!(response.error.as_ref().unwrap().code, -32700);
        assert_eq!(response.id, Value::Null);

        // Next line still gets a normal response.
        let next = server
            .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
            .await
            .unwrap();
        assert!(next.error.is_none());
    }

    #[tokio::test]
    async fn valid_json_invalid_envelope_is_rejected() {
        let server = server();
        let response = server.handle_line(r#"{"no": "method"}"#).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32600);
    }

    #[tokio::test]
    async fn initialized_notification_produces_no_output() {
        let server = server();
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn request_without_id_is_treated_as_notification() {
        let server = server();
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","method":"tools/list"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn initialize_reports_capabilities_and_server_info() {
        let server = server();
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "toolgate-mcp");
    }

    #[tokio::test]
    async fn tools_list_returns_registered_definitions() {
        let server = server();
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
            .await
            .unwrap();

        let result = response.result.unwrap();
        let tools = result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "echo");
        assert!(tools[0].get("inputSchema").is_some());
    }

    #[tokio::test]
    async fn tools_call_round_trip() {
        let server = server();
        let response = server
            .handle_line(
                r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"echo","arguments":{"message":"hi"}}}"#,
            )
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["content"][0]["text"], "hi");
        assert_eq!(result["isError"], false);
    }

    #[tokio::test]
    async fn tool_failure_stays_inside_the_result_envelope() {
        let server = server();
        let response = server
            .handle_line(
                r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"explode","arguments":{}}}"#,
            )
            .await
            .unwrap();

        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Tool execution failed"));
    }

    #[tokio::test]
    async fn unknown_tool_returns_not_found_result() {
        let server = server();
        let response = server
            .handle_line(
                r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"nonexistent","arguments":{}}}"#,
            )
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["content"][0]["text"], "Tool 'nonexistent' not found");
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn tools_call_without_params_is_invalid() {
        let server = server();
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","id":6,"method":"tools/call"}"#)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let server = server();
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","id":7,"method":"prompts/list"}"#)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn resources_list_and_read() {
        let server = server();
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","id":8,"method":"resources/list"}"#)
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["resources"][0]["uri"], "echo://help");

        let response = server
            .handle_line(
                r#"{"jsonrpc":"2.0","id":9,"method":"resources/read","params":{"uri":"echo://help"}}"#,
            )
            .await
            .unwrap();
        let result = response.result.unwrap();
        let text = result["contents"][0]["text"].as_str().unwrap();
        assert!(text.contains("1. echo"));
    }

    #[tokio::test]
    async fn unknown_resource_is_internal_error() {
        let server = server();
        let response = server
            .handle_line(
                r#"{"jsonrpc":"2.0","id":10,"method":"resources/read","params":{"uri":"ghost://help"}}"#,
            )
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32603);
    }
}
