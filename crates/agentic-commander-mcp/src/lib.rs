//! AgenticCommander MCP Server — policy-checked shell command execution for LLM agents.

pub mod config;
pub mod logging;
pub mod protocol;
pub mod repl;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::{ConfigArgs, ServerConfig};
pub use protocol::ProtocolHandler;
pub use tools::ToolRegistry;
pub use transport::StdioTransport;
