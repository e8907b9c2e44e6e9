//! HTTP transport — JSON-RPC over `POST /mcp`, bearer auth, and `/health`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Json as AxumJson, Response},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::protocol::ProtocolHandler;
use crate::types::{McpError, McpResult, RequestId};

/// Shared server state passed to all handlers via axum State.
pub struct ServerState {
    pub token: Option<String>,
    pub handler: Arc<ProtocolHandler>,
}

/// HTTP transport for networked MCP clients.
pub struct HttpTransport {
    state: Arc<ServerState>,
}

impl HttpTransport {
    pub fn new(handler: Arc<ProtocolHandler>, token: Option<String>) -> Self {
        Self {
            state: Arc::new(ServerState { token, handler }),
        }
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Serve until Ctrl-C, then drain in-flight requests.
    pub async fn run(&self, addr: SocketAddr) -> McpResult<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(McpError::Io)?;

        tracing::info!("HTTP transport listening on {addr}");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| McpError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// Build the application router. `/health` bypasses the auth layer.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/mcp", post(handle_request))
        .layer(middleware::from_fn_with_state(state.clone(), auth_layer))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Auth middleware — checks Bearer token if configured.
async fn auth_layer(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: middleware::Next,
) -> Response {
    if let Some(expected) = &state.token {
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected);

        if !authorized {
            tracing::warn!("Rejected unauthenticated request to {}", request.uri().path());
            let body = McpError::Unauthorized.to_json_rpc_error(RequestId::Null);
            return (StatusCode::UNAUTHORIZED, AxumJson(body)).into_response();
        }
    }

    next.run(request).await
}

/// One envelope in, one envelope (or `202 Accepted`) out.
async fn handle_request(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    let Ok(text) = std::str::from_utf8(&body) else {
        let error = McpError::ParseError("body is not valid UTF-8".to_string())
            .to_json_rpc_error(RequestId::Null);
        return AxumJson(error).into_response();
    };

    match state.handler.handle_raw(text).await {
        Some(response) => AxumJson(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Health check endpoint — no auth required.
async fn handle_health() -> AxumJson<serde_json::Value> {
    AxumJson(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
