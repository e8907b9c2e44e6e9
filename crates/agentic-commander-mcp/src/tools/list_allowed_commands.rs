//! Tool: list_allowed_commands — Show the allow-list prefixes.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agentic_commander::CommandEngine;

use crate::types::{McpResult, ToolAnnotations, ToolCallResult, ToolDefinition};

use super::registry::ToolHandler;

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_allowed_commands".to_string(),
        description: Some(
            "List the command prefixes this server permits. An empty list means every \
             command not blocked is allowed."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
        annotations: Some(ToolAnnotations::read_only("List Allowed Commands")),
    }
}

pub struct ListAllowedCommands {
    engine: Arc<CommandEngine>,
}

impl ListAllowedCommands {
    pub fn new(engine: Arc<CommandEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl ToolHandler for ListAllowedCommands {
    async fn call(&self, _args: Value) -> McpResult<ToolCallResult> {
        let policy = self.engine.policy();
        Ok(ToolCallResult::json(&json!({
            "allowed_commands": policy.allow_patterns(),
            "allow_all": policy.allows_all(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolContent;
    use agentic_commander::{ExecutorConfig, Policy};

    #[tokio::test]
    async fn test_lists_patterns() {
        let engine = CommandEngine::new(
            Policy::new(["git", "npm"], Vec::<String>::new()),
            ExecutorConfig::default(),
        )
        .unwrap();
        let result = ListAllowedCommands::new(Arc::new(engine))
            .call(json!({}))
            .await
            .unwrap();
        let ToolContent::Text { text } = &result.content[0];
        let value: Value = serde_json::from_str(text).unwrap();
        assert_eq!(value["allowed_commands"], json!(["git", "npm"]));
        assert_eq!(value["allow_all"], false);
    }

    #[tokio::test]
    async fn test_empty_list_allows_all() {
        let engine = CommandEngine::new(Policy::allow_all(), ExecutorConfig::default()).unwrap();
        let result = ListAllowedCommands::new(Arc::new(engine))
            .call(json!({}))
            .await
            .unwrap();
        let ToolContent::Text { text } = &result.content[0];
        let value: Value = serde_json::from_str(text).unwrap();
        assert_eq!(value["allowed_commands"], json!([]));
        assert_eq!(value["allow_all"], true);
    }
}
