//! Tool: get_shell_info — Describe how commands are interpreted.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agentic_commander::{format_duration, CommandEngine};

use crate::types::{McpResult, ToolAnnotations, ToolCallResult, ToolDefinition};

use super::registry::ToolHandler;

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_shell_info".to_string(),
        description: Some(
            "Show the shell used to run commands and the default and maximum timeouts."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
        annotations: Some(ToolAnnotations::read_only("Get Shell Info")),
    }
}

pub struct GetShellInfo {
    engine: Arc<CommandEngine>,
}

impl GetShellInfo {
    pub fn new(engine: Arc<CommandEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl ToolHandler for GetShellInfo {
    async fn call(&self, _args: Value) -> McpResult<ToolCallResult> {
        let executor = self.engine.executor();
        Ok(ToolCallResult::json(&json!({
            "shell": executor.shell().program,
            "shell_arg": executor.shell().flag,
            "default_timeout": format_duration(executor.default_timeout()),
            "max_timeout": format_duration(executor.max_timeout()),
        })))
    }
}
