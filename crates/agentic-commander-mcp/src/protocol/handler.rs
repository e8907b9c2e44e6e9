//! Main request dispatcher — receives JSON-RPC messages, routes to handlers.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::tools::ToolRegistry;
use crate::types::*;

use super::negotiation::negotiate;
use super::validator::validate_request;

/// Dispatches incoming JSON-RPC messages. Holds no per-connection state, so a
/// single handler is shared by every transport task.
pub struct ProtocolHandler {
    registry: Arc<ToolRegistry>,
}

impl ProtocolHandler {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one raw message. `None` means nothing must be written back.
    pub async fn handle_raw(&self, text: &str) -> Option<Value> {
        match JsonRpcMessage::parse(text) {
            Ok(msg) => self.handle_message(msg).await,
            Err(e) => {
                tracing::warn!("Rejected message: {}", e.error.message);
                Some(to_value(&e))
            }
        }
    }

    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<Value> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif);
                None
            }
            JsonRpcMessage::Response(_) => {
                tracing::debug!("Ignoring response message from client");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Value {
        if let Err(e) = validate_request(&request) {
            return to_value(&e.to_json_rpc_error(request.id));
        }

        let id = request.id.clone();
        tracing::debug!("Request {id}: {}", request.method);

        match self.dispatch_request(request).await {
            Ok(value) => to_value(&JsonRpcResponse::new(id, value)),
            Err(e) => to_value(&e.to_json_rpc_error(id)),
        }
    }

    async fn dispatch_request(&self, request: JsonRpcRequest) -> McpResult<Value> {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(request.params).await,
            "ping" => Ok(Value::Object(serde_json::Map::new())),
            _ => Err(McpError::MethodNotFound(request.method)),
        }
    }

    fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "notifications/initialized" | "initialized" => {
                tracing::info!("Client finished initialization");
            }
            "notifications/cancelled" | "$/cancelRequest" => {
                tracing::info!("Received cancellation notification");
            }
            _ => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let init_params: InitializeParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .unwrap_or_default();

        serde_json::to_value(negotiate(init_params))
            .map_err(|e| McpError::InternalError(e.to_string()))
    }

    fn handle_tools_list(&self) -> McpResult<Value> {
        let result = ToolListResult {
            tools: self.registry.list_tools(),
            next_cursor: None,
        };
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> McpResult<Value> {
        let call_params: ToolCallParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Tool call params required".to_string()))?;

        let result = self
            .registry
            .call(&call_params.name, call_params.arguments)
            .await;

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }
}

fn to_value(message: &impl Serialize) -> Value {
    serde_json::to_value(message).unwrap_or_default()
}
