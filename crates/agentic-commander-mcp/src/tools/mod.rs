//! MCP tool implementations.

pub mod execute_command;
pub mod get_shell_info;
pub mod google_search;
pub mod list_allowed_commands;
pub mod list_blocked_commands;
pub mod registry;
pub mod web_fetch;

pub use registry::{ToolHandler, ToolRegistry};
