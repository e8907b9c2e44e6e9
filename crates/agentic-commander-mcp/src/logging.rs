//! Logging setup and structured server events.
//!
//! Everything goes to stderr; stdout belongs to the stdio transport.

use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use agentic_commander::{command_name, format_elapsed, ExecutionRequest, ExecutionResult, Rejection};

use crate::config::ServerConfig;
use crate::types::{McpError, McpResult};

/// Target for per-call access events, hidden at plain `info`.
pub const ACCESS_TARGET: &str = "access";

/// Log file prefix and the subfolder used under a user-chosen log directory.
pub const APP_NAME: &str = "agentic-commander";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Access,
    Debug,
}

impl LogLevel {
    /// Lenient parse; unknown names fall back to `info`.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => LogLevel::Off,
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "access" => LogLevel::Access,
            "debug" | "trace" => LogLevel::Debug,
            _ => LogLevel::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Access => "access",
            LogLevel::Debug => "debug",
        }
    }

    /// `EnvFilter` directive for this level.
    pub fn directive(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info,access=off",
            LogLevel::Access => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keeps the file writer flushing; drop it only at process exit.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global subscriber. `RUST_LOG` overrides `level`.
pub fn init(level: LogLevel, log_dir: Option<&Path>) -> McpResult<LoggingGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.directive()));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_ansi(false);

    let (file_layer, file_guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(APP_NAME)
                .filename_suffix("log")
                .build(dir)
                .map_err(|e| McpError::Config(format!("cannot open log directory: {e}")))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| McpError::Config(format!("logging already initialized: {e}")))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// `TOOL_CALL`: argument keys only, never values.
pub fn tool_call(tool: &str, args: &Value) {
    let keys: Vec<&str> = args
        .as_object()
        .map(|obj| obj.keys().map(String::as_str).collect())
        .unwrap_or_default();
    tracing::info!(target: ACCESS_TARGET, tool, arg_keys = ?keys, "TOOL_CALL");
}

pub fn command_exec(request: &ExecutionRequest, result: &ExecutionResult) {
    let working_directory = request
        .working_directory
        .as_deref()
        .map(|d| d.display().to_string())
        .unwrap_or_default();
    tracing::info!(
        target: ACCESS_TARGET,
        command = %request.command,
        program = %command_name(&request.command),
        working_directory = %working_directory,
        exit_code = result.exit_code,
        duration = %format_elapsed(result.duration),
        error = result.error.as_deref().unwrap_or(""),
        "CMD_EXEC"
    );
}

pub fn command_blocked(command: &str, rejection: &Rejection) {
    tracing::warn!(command, reason = %rejection, "CMD_BLOCKED");
}

/// `WEB_REQUEST`: one outbound HTTP call made by a web tool.
pub fn web_request(
    tool: &str,
    method: &str,
    url: &str,
    status: u16,
    bytes: usize,
    duration: Duration,
) {
    tracing::info!(
        target: ACCESS_TARGET,
        tool,
        method,
        url,
        status,
        bytes,
        duration = %format_elapsed(duration),
        "WEB_REQUEST"
    );
}

pub fn startup(config: &ServerConfig) {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "SERVER STARTUP");
    for setting in config.settings() {
        tracing::info!(
            "  {}: {} (source: {})",
            setting.name,
            setting.value,
            setting.source
        );
    }
}

pub fn shutdown(reason: &str) {
    tracing::info!(reason, "SERVER SHUTDOWN");
}
