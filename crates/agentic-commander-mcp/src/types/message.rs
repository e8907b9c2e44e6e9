//! JSON-RPC 2.0 message types for the MCP protocol.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::error::McpError;

/// JSON-RPC 2.0 protocol version.
pub const JSONRPC_VERSION: &str = "2.0";

/// Unique request identifier — can be string, number, or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    /// Kept as sent, including fractional and unsigned 64-bit ids.
    Number(Number),
    Null,
}

impl RequestId {
    /// Recover an id from a raw envelope value; anything unusable becomes `Null`.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => RequestId::String(s.clone()),
            Value::Number(n) => RequestId::Number(n.clone()),
            _ => RequestId::Null,
        }
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::Null => write!(f, "null"),
        }
    }
}

/// A JSON-RPC 2.0 request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// A JSON-RPC 2.0 success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    pub result: Value,
}

/// A JSON-RPC 2.0 error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub jsonrpc: String,
    pub id: RequestId,
    pub error: JsonRpcErrorObject,
}

/// Error object within a JSON-RPC error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A JSON-RPC 2.0 notification (no id, no response expected).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Any inbound JSON-RPC message, classified by which envelope keys are present.
#[derive(Debug, Clone)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
    /// A `result` or `error` envelope sent by the client; never answered.
    Response(Value),
}

impl JsonRpcMessage {
    /// Classify a parsed envelope.
    ///
    /// `method` with an `id` key (even `null`) is a request; `method` without
    /// the key is a notification. No `method` is only acceptable for client
    /// responses. Failures carry whatever id could be recovered.
    pub fn from_value(value: Value) -> Result<Self, JsonRpcError> {
        let Value::Object(mut obj) = value else {
            return Err(McpError::InvalidRequest("Envelope must be a JSON object".to_string())
                .to_json_rpc_error(RequestId::Null));
        };

        let id = obj.get("id").map(RequestId::from_value);

        let method = match obj.remove("method") {
            Some(Value::String(method)) => method,
            Some(_) => {
                return Err(McpError::InvalidRequest("Method must be a string".to_string())
                    .to_json_rpc_error(id.unwrap_or(RequestId::Null)));
            }
            None if obj.contains_key("result") || obj.contains_key("error") => {
                return Ok(JsonRpcMessage::Response(Value::Object(obj)));
            }
            None => {
                return Err(McpError::InvalidRequest("Missing method".to_string())
                    .to_json_rpc_error(id.unwrap_or(RequestId::Null)));
            }
        };

        let jsonrpc = match obj.remove("jsonrpc") {
            Some(Value::String(version)) => version,
            _ => String::new(),
        };
        let params = obj.remove("params").filter(|p| !p.is_null());

        Ok(match id {
            Some(id) => JsonRpcMessage::Request(JsonRpcRequest {
                jsonrpc,
                id,
                method,
                params,
            }),
            None => JsonRpcMessage::Notification(JsonRpcNotification {
                jsonrpc,
                method,
                params,
            }),
        })
    }

    /// Parse raw text into a classified message.
    pub fn parse(text: &str) -> Result<Self, JsonRpcError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| McpError::ParseError(e.to_string()).to_json_rpc_error(RequestId::Null))?;
        Self::from_value(value)
    }
}

impl JsonRpcResponse {
    pub fn new(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result,
        }
    }
}
