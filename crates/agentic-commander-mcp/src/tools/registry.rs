//! Tool registration and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use agentic_commander::CommandEngine;

use crate::logging;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::{
    execute_command, get_shell_info, google_search, list_allowed_commands, list_blocked_commands,
    web_fetch,
};

/// A callable tool. Handlers hold only shared immutable state.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value) -> McpResult<ToolCallResult>;
}

struct RegisteredTool {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
}

/// Name → handler table, filled at startup and read-only afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in tool. Command tools share one engine.
    pub fn with_builtin_tools(
        engine: Arc<CommandEngine>,
        using_default_blocklist: bool,
    ) -> McpResult<Self> {
        let mut registry = Self::new();
        registry.register(
            execute_command::definition(),
            execute_command::ExecuteCommand::new(engine.clone()),
        )?;
        registry.register(
            list_allowed_commands::definition(),
            list_allowed_commands::ListAllowedCommands::new(engine.clone()),
        )?;
        registry.register(
            list_blocked_commands::definition(),
            list_blocked_commands::ListBlockedCommands::new(
                engine.clone(),
                using_default_blocklist,
            ),
        )?;
        registry.register(
            get_shell_info::definition(),
            get_shell_info::GetShellInfo::new(engine),
        )?;
        registry.register(web_fetch::definition(), web_fetch::WebFetch::new()?)?;
        registry.register(
            google_search::definition(),
            google_search::GoogleSearch::new()?,
        )?;
        Ok(registry)
    }

    /// Add a tool. Names are unique; a duplicate is a startup error.
    pub fn register(
        &mut self,
        definition: ToolDefinition,
        handler: impl ToolHandler + 'static,
    ) -> McpResult<()> {
        if self.index.contains_key(&definition.name) {
            return Err(McpError::DuplicateTool(definition.name));
        }
        self.index.insert(definition.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            definition,
            handler: Arc::new(handler),
        });
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.index
            .get(name)
            .map(|&i| self.tools[i].handler.clone())
    }

    /// Definitions in registration order.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool. Every failure here is tool-level: the caller always gets
    /// a result, flagged with `isError` when something went wrong.
    pub async fn call(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));
        logging::tool_call(name, &args);

        let Some(handler) = self.lookup(name) else {
            tracing::warn!("Unknown tool requested: {name}");
            return ToolCallResult::error(McpError::ToolNotFound(name.to_string()).to_string());
        };

        match handler.call(args).await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!("Tool {name} failed: {e}");
                ToolCallResult::error(e.to_string())
            }
        }
    }
}
