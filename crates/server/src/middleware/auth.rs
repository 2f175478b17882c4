// API key gate applied to every route except the explicit allow-list.

use crate::api::ErrorResponse;
use crate::config::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use toolgate_core::auth::redact;

/// Routes that never require a key. The tool catalog is read-only and
/// stays open; executing a tool is always gated.
pub const EXEMPT_PATHS: &[&str] = &["/", "/health", "/tools", "/docs", "/openapi.json"];

/// Resolved client label, attached to the request for audit logging.
/// Flat trust model: the label carries no authorization scope.
#[derive(Debug, Clone)]
pub struct ClientLabel(pub String);

pub async fn require_api_key(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if EXEMPT_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let key = request
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let Some(key) = key else {
        return unauthorized("Missing API key. Include X-API-Key header.");
    };

    match state.api_keys.validate(&key) {
        Some(label) => {
            request
                .extensions_mut()
                .insert(ClientLabel(label.to_string()));
            next.run(request).await
        }
        None => {
            tracing::warn!(key = %redact(&key), "invalid API key attempt");
            unauthorized("Invalid API key")
        }
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(message))).into_response()
}
