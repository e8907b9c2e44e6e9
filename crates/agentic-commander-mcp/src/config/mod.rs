//! Configuration loading and resolution.
//!
//! Every setting resolves with priority flag > environment > default, and
//! remembers where its value came from for the startup banner.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;

use agentic_commander::{
    format_duration, parse_command_list, parse_duration, CommandEngine, ExecutorConfig, Policy,
    ShellConfig, DEFAULT_MAX_TIMEOUT, DEFAULT_TIMEOUT,
};

use crate::logging::{LogLevel, APP_NAME};
use crate::types::{McpError, McpResult};

pub const ENV_LOG_DIR: &str = "MCP_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "MCP_LOG_LEVEL";
pub const ENV_ALLOWED_COMMANDS: &str = "MCP_ALLOWED_COMMANDS";
pub const ENV_BLOCKED_COMMANDS: &str = "MCP_BLOCKED_COMMANDS";
pub const ENV_USE_DEFAULT_BLOCKLIST: &str = "MCP_USE_DEFAULT_BLOCKLIST";
pub const ENV_DEFAULT_TIMEOUT: &str = "MCP_DEFAULT_TIMEOUT";
pub const ENV_MAX_TIMEOUT: &str = "MCP_MAX_TIMEOUT";
pub const ENV_SHELL: &str = "MCP_SHELL";
pub const ENV_SHELL_ARG: &str = "MCP_SHELL_ARG";
pub const ENV_TOKEN: &str = "AGENTIC_TOKEN";

/// Environment file read at startup, relative to the home directory.
pub const ENV_FILE_NAME: &str = ".mcp_env";

/// Server settings shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Directory for rotated log files (env: MCP_LOG_DIR).
    #[arg(long, global = true)]
    pub log_dir: Option<String>,

    /// Log level: off, error, warn, info, access, debug (env: MCP_LOG_LEVEL).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Comma-separated command prefixes to allow; empty allows all (env: MCP_ALLOWED_COMMANDS).
    #[arg(long, global = true)]
    pub allowed_commands: Option<String>,

    /// Comma-separated patterns to block (env: MCP_BLOCKED_COMMANDS).
    #[arg(long, global = true)]
    pub blocked_commands: Option<String>,

    /// Append the built-in blocklist of destructive commands (env: MCP_USE_DEFAULT_BLOCKLIST).
    #[arg(long, global = true, value_name = "BOOL")]
    pub use_default_blocklist: Option<bool>,

    /// Default command timeout, e.g. 30s or 2m (env: MCP_DEFAULT_TIMEOUT).
    #[arg(long, global = true)]
    pub timeout: Option<String>,

    /// Upper bound for caller-supplied timeouts (env: MCP_MAX_TIMEOUT).
    #[arg(long, global = true)]
    pub max_timeout: Option<String>,

    /// Shell program used to run commands (env: MCP_SHELL).
    #[arg(long, global = true)]
    pub shell: Option<String>,

    /// Flag passed to the shell before the command (env: MCP_SHELL_ARG).
    #[arg(long, global = true)]
    pub shell_arg: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Flag,
    Environment,
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ConfigSource::Flag => "flag",
            ConfigSource::Environment => "environment",
            ConfigSource::Default => "default",
        })
    }
}

/// One resolved setting, as shown in the startup banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub name: &'static str,
    pub value: String,
    pub source: ConfigSource,
}

/// Pick the first non-blank value from flag, then environment.
pub fn resolve_priority(
    flag: Option<&str>,
    env_value: Option<String>,
) -> Option<(String, ConfigSource)> {
    if let Some(value) = flag.filter(|v| !v.trim().is_empty()) {
        return Some((value.to_string(), ConfigSource::Flag));
    }
    env_value
        .filter(|v| !v.trim().is_empty())
        .map(|v| (v, ConfigSource::Environment))
}

/// Immutable, fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub log_dir: Option<PathBuf>,
    pub log_level: LogLevel,
    pub policy: Policy,
    pub using_default_blocklist: bool,
    pub executor: ExecutorConfig,
    settings: Vec<Setting>,
}

impl ServerConfig {
    /// Resolve against the process environment.
    pub fn from_args(args: &ConfigArgs) -> McpResult<Self> {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve(args: &ConfigArgs, env: impl Fn(&str) -> Option<String>) -> McpResult<Self> {
        let mut settings = Vec::new();
        let mut record = |name: &'static str, value: String, source: ConfigSource| {
            settings.push(Setting {
                name,
                value,
                source,
            });
        };

        let log_dir = match resolve_priority(args.log_dir.as_deref(), env(ENV_LOG_DIR)) {
            Some((dir, source)) => {
                let dir = PathBuf::from(dir).join(APP_NAME);
                record("log_dir", dir.display().to_string(), source);
                Some(dir)
            }
            None => {
                record("log_dir", "(stderr only)".to_string(), ConfigSource::Default);
                None
            }
        };

        let (level, source) = resolve_priority(args.log_level.as_deref(), env(ENV_LOG_LEVEL))
            .unwrap_or_else(|| ("info".to_string(), ConfigSource::Default));
        let log_level = LogLevel::parse(&level);
        record("log_level", log_level.to_string(), source);

        let (allowed, source) =
            resolve_priority(args.allowed_commands.as_deref(), env(ENV_ALLOWED_COMMANDS))
                .unwrap_or_else(|| (String::new(), ConfigSource::Default));
        let allowed = parse_command_list(&allowed);

        let (blocked, blocked_source) =
            resolve_priority(args.blocked_commands.as_deref(), env(ENV_BLOCKED_COMMANDS))
                .unwrap_or_else(|| (String::new(), ConfigSource::Default));
        let blocked = parse_command_list(&blocked);

        let (using_default_blocklist, blocklist_source) = match args.use_default_blocklist {
            Some(flag) => (flag, ConfigSource::Flag),
            None => match env(ENV_USE_DEFAULT_BLOCKLIST).filter(|v| !v.trim().is_empty()) {
                Some(value) => (
                    parse_bool(ENV_USE_DEFAULT_BLOCKLIST, &value)?,
                    ConfigSource::Environment,
                ),
                None => (true, ConfigSource::Default),
            },
        };

        let mut policy = Policy::new(allowed, blocked);
        if using_default_blocklist {
            policy = policy.with_default_blocklist();
        }
        record(
            "allowed_commands",
            if policy.allows_all() {
                "(all)".to_string()
            } else {
                policy.allow_patterns().join(",")
            },
            source,
        );
        record("blocked_commands", policy.block_patterns().join(","), blocked_source);
        record(
            "use_default_blocklist",
            using_default_blocklist.to_string(),
            blocklist_source,
        );

        let (default_timeout, source) = resolve_duration(
            "timeout",
            args.timeout.as_deref(),
            env(ENV_DEFAULT_TIMEOUT),
            DEFAULT_TIMEOUT,
        )?;
        record("default_timeout", format_duration(default_timeout), source);

        let (max_timeout, source) = resolve_duration(
            "max_timeout",
            args.max_timeout.as_deref(),
            env(ENV_MAX_TIMEOUT),
            DEFAULT_MAX_TIMEOUT,
        )?;
        record("max_timeout", format_duration(max_timeout), source);

        let shell = resolve_priority(args.shell.as_deref(), env(ENV_SHELL));
        let shell_arg = resolve_priority(args.shell_arg.as_deref(), env(ENV_SHELL_ARG));
        let shell_source = shell
            .as_ref()
            .or(shell_arg.as_ref())
            .map(|(_, source)| *source)
            .unwrap_or(ConfigSource::Default);
        let shell = ShellConfig::resolve(
            shell.as_ref().map(|(v, _)| v.as_str()),
            shell_arg.as_ref().map(|(v, _)| v.as_str()),
        );
        record("shell", shell.to_string(), shell_source);

        Ok(Self {
            log_dir,
            log_level,
            policy,
            using_default_blocklist,
            executor: ExecutorConfig {
                shell,
                default_timeout,
                max_timeout,
            },
            settings,
        })
    }

    /// Resolved values in banner order.
    pub fn settings(&self) -> &[Setting] {
        &self.settings
    }

    /// Build the command engine; fails on inconsistent executor settings.
    pub fn build_engine(&self) -> McpResult<CommandEngine> {
        Ok(CommandEngine::new(self.policy.clone(), self.executor.clone())?)
    }
}

fn resolve_duration(
    name: &str,
    flag: Option<&str>,
    env_value: Option<String>,
    default: Duration,
) -> McpResult<(Duration, ConfigSource)> {
    match resolve_priority(flag, env_value) {
        Some((value, source)) => {
            let duration = parse_duration(&value)
                .map_err(|e| McpError::Config(format!("{name} ({source}): {e}")))?;
            Ok((duration, source))
        }
        None => Ok((default, ConfigSource::Default)),
    }
}

fn parse_bool(name: &str, value: &str) -> McpResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(McpError::Config(format!(
            "{name}: expected a boolean, got '{other}'"
        ))),
    }
}

pub fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Load `~/.mcp_env` without overriding variables already set.
/// Returns the path when a file was loaded.
pub fn load_env_file() -> Option<PathBuf> {
    let path = home_dir()?.join(ENV_FILE_NAME);
    load_env_file_from(&path).then_some(path)
}

pub fn load_env_file_from(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    match dotenvy::from_path(path) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("Warning: could not read {}: {e}", path.display());
            false
        }
    }
}
