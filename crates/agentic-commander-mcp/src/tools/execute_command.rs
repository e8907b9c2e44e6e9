//! Tool: execute_command — Validate a command against policy and run it.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use agentic_commander::{
    format_elapsed, parse_duration, CommandEngine, ExecutionRequest, ExecutionResult,
};

use crate::logging;
use crate::types::{McpError, McpResult, ToolAnnotations, ToolCallResult, ToolDefinition};

use super::registry::ToolHandler;

#[derive(Debug, Deserialize)]
struct ExecuteParams {
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    working_directory: Option<String>,
    #[serde(default)]
    timeout: Option<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

impl ExecuteParams {
    fn into_request(self) -> McpResult<ExecutionRequest> {
        let command = self
            .command
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| McpError::InvalidParams("command is required".to_string()))?;

        let mut request = ExecutionRequest::new(command);
        request.env = self.env;

        if let Some(dir) = self.working_directory.filter(|d| !d.trim().is_empty()) {
            let path = PathBuf::from(&dir);
            if !path.is_absolute() {
                return Err(McpError::InvalidParams(format!(
                    "working_directory must be an absolute path: {dir}"
                )));
            }
            request.working_directory = Some(path);
        }

        if let Some(timeout) = self.timeout.filter(|t| !t.trim().is_empty()) {
            let timeout = parse_duration(&timeout)
                .map_err(|e| McpError::InvalidParams(format!("invalid timeout format: {e}")))?;
            request.timeout = Some(timeout);
        }

        Ok(request)
    }
}

/// Wire form of an execution outcome.
#[derive(Debug, Serialize)]
struct ExecutionReport<'a> {
    stdout: &'a str,
    stderr: &'a str,
    exit_code: i32,
    duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<'a> From<&'a ExecutionResult> for ExecutionReport<'a> {
    fn from(result: &'a ExecutionResult) -> Self {
        Self {
            stdout: &result.stdout,
            stderr: &result.stderr,
            exit_code: result.exit_code,
            duration: format_elapsed(result.duration),
            error: result.error.as_deref(),
        }
    }
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "execute_command".to_string(),
        description: Some(
            "Execute a shell command on the host. The command is checked against the \
             configured allow and block lists before it runs."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Command line passed to the shell as a single argument"
                },
                "working_directory": {
                    "type": "string",
                    "description": "Absolute path of an existing directory to run in"
                },
                "timeout": {
                    "type": "string",
                    "description": "Deadline such as '30s', '5m' or '1m30s'; clamped to the server maximum"
                },
                "env": {
                    "type": "object",
                    "additionalProperties": { "type": "string" },
                    "description": "Extra environment variables layered over the server environment"
                }
            },
            "required": ["command"]
        }),
        annotations: Some(ToolAnnotations {
            title: Some("Execute Command".to_string()),
            read_only_hint: Some(false),
            destructive_hint: Some(true),
            idempotent_hint: Some(false),
            open_world_hint: Some(true),
        }),
    }
}

pub struct ExecuteCommand {
    engine: Arc<CommandEngine>,
}

impl ExecuteCommand {
    pub fn new(engine: Arc<CommandEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl ToolHandler for ExecuteCommand {
    async fn call(&self, args: Value) -> McpResult<ToolCallResult> {
        let params: ExecuteParams =
            serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;
        let request = params.into_request()?;

        if let Err(rejection) = self.engine.validate(&request.command) {
            logging::command_blocked(&request.command, &rejection);
            return Ok(ToolCallResult::error(format!(
                "Command validation failed: {rejection}"
            )));
        }

        let result = self.engine.execute(&request).await;
        logging::command_exec(&request, &result);

        let report = ExecutionReport::from(&result);
        Ok(if result.exit_code != 0 {
            ToolCallResult::json_error(&report)
        } else {
            ToolCallResult::json(&report)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolContent;
    use agentic_commander::{ExecutorConfig, Policy};

    fn tool(policy: Policy) -> ExecuteCommand {
        let engine = CommandEngine::new(policy, ExecutorConfig::default()).unwrap();
        ExecuteCommand::new(Arc::new(engine))
    }

    fn text(result: &ToolCallResult) -> &str {
        let ToolContent::Text { text } = &result.content[0];
        text
    }

    #[test]
    fn test_params_require_command() {
        let params: ExecuteParams = serde_json::from_value(json!({ "command": "   " })).unwrap();
        assert!(matches!(params.into_request(), Err(McpError::InvalidParams(_))));

        let params: ExecuteParams = serde_json::from_value(json!({})).unwrap();
        assert!(params.into_request().is_err());
    }

    #[test]
    fn test_params_keep_command_verbatim() {
        let params: ExecuteParams =
            serde_json::from_value(json!({ "command": "  printf '%s' x  " })).unwrap();
        let request = params.into_request().unwrap();
        assert_eq!(request.command, "  printf '%s' x  ");
    }

    #[test]
    fn test_params_reject_relative_directory() {
        let params: ExecuteParams =
            serde_json::from_value(json!({ "command": "ls", "working_directory": "src" }))
                .unwrap();
        let err = params.into_request().unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn test_params_parse_timeout_and_env() {
        let params: ExecuteParams = serde_json::from_value(json!({
            "command": "echo hi",
            "timeout": "1m30s",
            "env": { "FOO": "bar" },
            "working_directory": ""
        }))
        .unwrap();
        let request = params.into_request().unwrap();
        assert_eq!(request.timeout, Some(std::time::Duration::from_secs(90)));
        assert_eq!(request.env.get("FOO").map(String::as_str), Some("bar"));
        assert!(request.working_directory.is_none());
    }

    #[test]
    fn test_params_reject_bad_timeout() {
        let params: ExecuteParams =
            serde_json::from_value(json!({ "command": "ls", "timeout": "soon" })).unwrap();
        let err = params.into_request().unwrap_err();
        assert!(err.to_string().contains("invalid timeout format"));
    }

    #[test]
    fn test_params_reject_wrong_types() {
        assert!(serde_json::from_value::<ExecuteParams>(json!({ "command": 42 })).is_err());
        assert!(
            serde_json::from_value::<ExecuteParams>(json!({ "command": "ls", "env": { "A": 1 } }))
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_blocked_command_is_tool_error() {
        let tool = tool(Policy::allow_all().with_default_blocklist());
        let result = tool.call(json!({ "command": "rm -rf /" })).await.unwrap();
        assert!(result.is_error());
        assert!(text(&result).starts_with("Command validation failed: blocked"));
    }

    #[tokio::test]
    async fn test_not_allowed_command_is_tool_error() {
        let tool = tool(Policy::new(["git", "npm"], Vec::<String>::new()));
        let result = tool
            .call(json!({ "command": "cat /etc/passwd" }))
            .await
            .unwrap();
        assert!(result.is_error());
        assert!(text(&result).contains("not allowed"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_command_report() {
        let tool = tool(Policy::allow_all());
        let result = tool.call(json!({ "command": "echo hello" })).await.unwrap();
        assert!(!result.is_error());

        let report: Value = serde_json::from_str(text(&result)).unwrap();
        assert_eq!(report["stdout"].as_str().unwrap().trim(), "hello");
        assert_eq!(report["exit_code"], 0);
        assert!(report["duration"].is_string());
        assert!(report.get("error").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_tool_error() {
        let tool = tool(Policy::allow_all());
        let result = tool.call(json!({ "command": "exit 4" })).await.unwrap();
        assert!(result.is_error());
        let report: Value = serde_json::from_str(text(&result)).unwrap();
        assert_eq!(report["exit_code"], 4);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_report_carries_error() {
        let tool = tool(Policy::allow_all());
        let result = tool
            .call(json!({ "command": "sleep 10", "timeout": "200ms" }))
            .await
            .unwrap();
        assert!(result.is_error());
        let report: Value = serde_json::from_str(text(&result)).unwrap();
        assert_eq!(report["exit_code"], -1);
        assert!(report["error"]
            .as_str()
            .unwrap()
            .starts_with("command timed out after"));
    }
}
