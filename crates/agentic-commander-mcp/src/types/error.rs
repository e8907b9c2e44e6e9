//! Error types and JSON-RPC error codes for the MCP server.

use super::message::{JsonRpcError, JsonRpcErrorObject, RequestId, JSONRPC_VERSION};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// MCP-specific error codes.
pub mod mcp_error_codes {
    pub const TOOL_NOT_FOUND: i32 = -32803;

    /// Server: Unauthorized (missing or invalid bearer token).
    pub const UNAUTHORIZED: i32 = -32900;
}

/// All errors that can occur in the MCP server.
#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Command engine error: {0}")]
    Command(#[from] agentic_commander::CommanderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unauthorized — missing or invalid bearer token.
    #[error("Unauthorized")]
    Unauthorized,
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;
        match self {
            McpError::ParseError(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::InternalError(_) => INTERNAL_ERROR,
            McpError::ToolNotFound(_) => TOOL_NOT_FOUND,
            McpError::Command(_)
            | McpError::DuplicateTool(_)
            | McpError::Config(_)
            | McpError::Transport(_)
            | McpError::Io(_) => INTERNAL_ERROR,
            McpError::Json(_) => PARSE_ERROR,
            McpError::Unauthorized => UNAUTHORIZED,
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorObject {
                code: self.code(),
                message: self.to_string(),
                data: None,
            },
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(McpError::ParseError("x".into()).code(), -32700);
        assert_eq!(McpError::InvalidRequest("x".into()).code(), -32600);
        assert_eq!(McpError::MethodNotFound("x".into()).code(), -32601);
        assert_eq!(McpError::InvalidParams("x".into()).code(), -32602);
        assert_eq!(McpError::Unauthorized.code(), -32900);
    }

    #[test]
    fn test_to_json_rpc_error_keeps_id() {
        let err = McpError::MethodNotFound("foo/bar".to_string())
            .to_json_rpc_error(RequestId::Number(4.into()));
        assert_eq!(err.id, RequestId::Number(4.into()));
        assert_eq!(err.error.code, error_codes::METHOD_NOT_FOUND);
        assert_eq!(err.error.message, "Method not found: foo/bar");
    }
}
