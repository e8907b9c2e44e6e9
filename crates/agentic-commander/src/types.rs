//! Core data types for command requests, results, and engine errors.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fallback deadline when neither the caller nor the configuration supplies one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound applied to caller-supplied deadlines.
pub const DEFAULT_MAX_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Exit code reported when the command never produced a terminal status.
pub const INFRA_FAILURE_EXIT_CODE: i32 = -1;

/// The shell used to interpret command strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    pub program: String,
    pub flag: String,
}

impl ShellConfig {
    /// `/bin/sh -c` on Unix, `cmd /c` on Windows.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self {
                program: "cmd".to_string(),
                flag: "/c".to_string(),
            }
        } else {
            Self {
                program: "/bin/sh".to_string(),
                flag: "-c".to_string(),
            }
        }
    }

    /// Build from optional overrides; missing parts fall back to the platform default.
    pub fn resolve(program: Option<&str>, flag: Option<&str>) -> Self {
        let default = Self::platform_default();
        Self {
            program: program
                .filter(|p| !p.trim().is_empty())
                .map(str::to_string)
                .unwrap_or(default.program),
            flag: flag
                .filter(|f| !f.trim().is_empty())
                .map(str::to_string)
                .unwrap_or(default.flag),
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self::platform_default()
    }
}

impl std::fmt::Display for ShellConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.program, self.flag)
    }
}

/// Executor settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub shell: ShellConfig,
    pub default_timeout: Duration,
    pub max_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            shell: ShellConfig::platform_default(),
            default_timeout: DEFAULT_TIMEOUT,
            max_timeout: DEFAULT_MAX_TIMEOUT,
        }
    }
}

/// A single command execution request, already validated at the tool boundary.
#[derive(Debug, Clone, Default)]
pub struct ExecutionRequest {
    pub command: String,
    pub working_directory: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub env: BTreeMap<String, String>,
}

impl ExecutionRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Outcome of one execution. Every failure mode is encoded here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
    pub error: Option<String>,
}

impl ExecutionResult {
    /// A result for a command that never ran to completion.
    pub fn failed(error: impl Into<String>, duration: Duration) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: INFRA_FAILURE_EXIT_CODE,
            duration,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0 && self.error.is_none()
    }

    pub fn timed_out(&self) -> bool {
        self.error
            .as_deref()
            .is_some_and(|e| e.starts_with("command timed out"))
    }
}

/// Human-readable duration (`30s`, `1m 30s`, `200ms`).
pub fn format_duration(duration: Duration) -> String {
    humantime::format_duration(duration).to_string()
}

/// Elapsed wall-clock time, rounded to milliseconds for display.
pub fn format_elapsed(duration: Duration) -> String {
    format_duration(Duration::from_millis(duration.as_millis() as u64))
}

/// Parse a duration string such as `30s`, `1m30s`, or `200ms`.
pub fn parse_duration(input: &str) -> CommanderResult<Duration> {
    humantime::parse_duration(input.trim())
        .map_err(|e| CommanderError::InvalidDuration(format!("'{}': {e}", input.trim())))
}

/// Errors raised while building the command engine.
#[derive(thiserror::Error, Debug)]
pub enum CommanderError {
    #[error("Invalid shell: {0}")]
    InvalidShell(String),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Invalid duration {0}")]
    InvalidDuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CommanderResult<T> = Result<T, CommanderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_resolve_defaults() {
        let shell = ShellConfig::resolve(None, None);
        assert_eq!(shell, ShellConfig::platform_default());

        let shell = ShellConfig::resolve(Some("/bin/bash"), None);
        assert_eq!(shell.program, "/bin/bash");
        assert_eq!(shell.flag, ShellConfig::platform_default().flag);

        let shell = ShellConfig::resolve(Some("  "), Some("-lc"));
        assert_eq!(shell.program, ShellConfig::platform_default().program);
        assert_eq!(shell.flag, "-lc");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration(" 200ms ").unwrap(), Duration::from_millis(200));
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_millis(200)), "200ms");
        assert_eq!(format_elapsed(Duration::from_micros(1_500_700)), "1s 500ms");
    }

    #[test]
    fn test_failed_result() {
        let result = ExecutionResult::failed("boom", Duration::from_millis(3));
        assert_eq!(result.exit_code, INFRA_FAILURE_EXIT_CODE);
        assert!(!result.is_success());
        assert!(!result.timed_out());
        assert_eq!(result.error.as_deref(), Some("boom"));
    }
}
