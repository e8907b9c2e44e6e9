//! Tool: list_blocked_commands — Show the block-list patterns.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agentic_commander::CommandEngine;

use crate::types::{McpResult, ToolAnnotations, ToolCallResult, ToolDefinition};

use super::registry::ToolHandler;

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_blocked_commands".to_string(),
        description: Some(
            "List the patterns that cause a command to be rejected. A command is blocked \
             when it starts with or contains any of them."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
        annotations: Some(ToolAnnotations::read_only("List Blocked Commands")),
    }
}

pub struct ListBlockedCommands {
    engine: Arc<CommandEngine>,
    using_default_blocklist: bool,
}

impl ListBlockedCommands {
    pub fn new(engine: Arc<CommandEngine>, using_default_blocklist: bool) -> Self {
        Self {
            engine,
            using_default_blocklist,
        }
    }
}

#[async_trait]
impl ToolHandler for ListBlockedCommands {
    async fn call(&self, _args: Value) -> McpResult<ToolCallResult> {
        Ok(ToolCallResult::json(&json!({
            "blocked_commands": self.engine.policy().block_patterns(),
            "using_default_blocklist": self.using_default_blocklist,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolContent;
    use agentic_commander::{ExecutorConfig, Policy};

    #[tokio::test]
    async fn test_lists_user_patterns_before_defaults() {
        let policy = Policy::new(Vec::<String>::new(), ["curl"]).with_default_blocklist();
        let engine = CommandEngine::new(policy, ExecutorConfig::default()).unwrap();
        let result = ListBlockedCommands::new(Arc::new(engine), true)
            .call(json!({}))
            .await
            .unwrap();
        let ToolContent::Text { text } = &result.content[0];
        let value: Value = serde_json::from_str(text).unwrap();
        let blocked = value["blocked_commands"].as_array().unwrap();
        assert_eq!(blocked[0], "curl");
        assert!(blocked.len() > 1);
        assert_eq!(value["using_default_blocklist"], true);
    }
}
