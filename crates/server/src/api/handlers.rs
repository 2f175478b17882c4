// Route handlers for the HTTP tool surface.

use crate::api::ErrorResponse;
use crate::config::AppState;
use crate::middleware::auth::ClientLabel;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;

/// Root/info endpoint.
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Toolgate MCP Server",
        "version": env!("CARGO_PKG_VERSION"),
        "clients": state.registry.names(),
    }))
}

/// Health check: per-client enabled flags, never authenticated.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mut clients = serde_json::Map::new();
    for provider in state.registry.providers() {
        clients.insert(
            provider.name().to_string(),
            serde_json::Value::Bool(provider.is_enabled()),
        );
    }

    Json(serde_json::json!({
        "status": "healthy",
        "clients": clients,
    }))
}

#[derive(Debug, Serialize)]
pub struct ToolCatalog {
    pub tools: Vec<CatalogTool>,
}

/// Flattened catalog entry: the tool plus its owning client slug. The
/// REST surface uses snake_case `input_schema`; the bridge renames it to
/// the camelCase protocol field.
#[derive(Debug, Serialize)]
pub struct CatalogTool {
    pub name: String,
    pub description: String,
    pub client: String,
    pub input_schema: serde_json::Value,
}

/// Flattened tool catalog across all enabled providers.
pub async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    let mut tools = Vec::new();
    for provider in state.registry.providers() {
        if !provider.is_enabled() {
            continue;
        }
        for tool in provider.tools() {
            tools.push(CatalogTool {
                name: tool.name.clone(),
                description: tool.description.clone(),
                client: provider.name().to_string(),
                input_schema: tool.input_schema.clone(),
            });
        }
    }

    Json(ToolCatalog { tools })
}

/// Execute a tool. The request body is the raw arguments object, passed
/// straight through to the owning provider.
pub async fn execute_tool(
    State(state): State<AppState>,
    Path(tool_name): Path<String>,
    client: Option<Extension<ClientLabel>>,
    Json(arguments): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let client = client.map(|Extension(label)| label.0);
    tracing::info!(
        client = client.as_deref().unwrap_or("unknown"),
        tool = %tool_name,
        "executing tool"
    );

    let Some(provider) = state.dispatcher.find_tool(&tool_name) else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Tool '{tool_name}' not found"))),
        ));
    };

    match provider.execute_tool(&tool_name, arguments).await {
        Ok(result) if result.is_error => {
            let detail = result.first_text().unwrap_or("Tool reported an error");
            Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::new(detail))))
        }
        Ok(result) => Ok(Json(serde_json::json!({
            "tool": tool_name,
            "result": result.first_text().unwrap_or("No result"),
        }))),
        Err(e) => {
            tracing::error!(tool = %tool_name, error = %e, "tool execution failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            ))
        }
    }
}
