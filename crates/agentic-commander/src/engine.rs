//! Policy and executor bundled into the value command tools are handed.

use crate::executor::CommandExecutor;
use crate::policy::Policy;
use crate::types::{CommanderResult, ExecutionRequest, ExecutionResult, ExecutorConfig};
use crate::validator::{validate, Rejection};

/// Immutable command engine shared across all concurrent tool calls.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    policy: Policy,
    executor: CommandExecutor,
}

impl CommandEngine {
    pub fn new(policy: Policy, config: ExecutorConfig) -> CommanderResult<Self> {
        Ok(Self {
            policy,
            executor: CommandExecutor::new(config)?,
        })
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    pub fn validate(&self, command: &str) -> Result<(), Rejection> {
        validate(command, &self.policy)
    }

    /// Execute without consulting the policy; callers validate first.
    pub async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        self.executor.execute(request).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_engine_validates_then_executes() {
        let engine = CommandEngine::new(
            Policy::new(["echo"], Vec::<String>::new()).with_default_blocklist(),
            ExecutorConfig::default(),
        )
        .unwrap();

        assert!(engine.validate("echo hello").is_ok());
        assert_eq!(engine.validate("ls"), Err(Rejection::NotAllowed));
        assert!(engine.validate("echo x; rm -rf /").is_err());

        let result = engine.execute(&ExecutionRequest::new("echo hello")).await;
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout.trim(), "hello");
    }
}
