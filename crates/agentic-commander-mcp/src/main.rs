//! AgenticCommander MCP Server — entry point.

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use agentic_commander::command_name;
use agentic_commander_mcp::config::{self, ConfigArgs, ServerConfig};
use agentic_commander_mcp::logging;
use agentic_commander_mcp::protocol::ProtocolHandler;
use agentic_commander_mcp::repl::{self, ReplContext};
use agentic_commander_mcp::tools::ToolRegistry;
use agentic_commander_mcp::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "agentic-commander-mcp",
    about = "MCP server for AgenticCommander — policy-checked shell command execution for LLM agents",
    version
)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Start MCP server over HTTP.
    #[cfg(feature = "http")]
    ServeHttp {
        /// Listen host.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Listen port.
        #[arg(long, default_value_t = 3000)]
        port: u16,

        /// Bearer token for authentication.
        /// Also reads from AGENTIC_TOKEN env var.
        #[arg(long)]
        token: Option<String>,
    },

    /// Check a command against the configured policy without running it.
    Check {
        /// The command line to check.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Print server capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   agentic-commander-mcp completions bash > ~/.local/share/bash-completion/completions/agentic-commander-mcp
    ///   agentic-commander-mcp completions zsh > ~/.zfunc/_agentic-commander-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },

    /// Launch interactive REPL mode.
    Repl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Must precede resolution so the file's variables act as environment.
    let env_file = config::load_env_file();

    let cli = Cli::parse();
    let server_config = ServerConfig::from_args(&cli.config)?;

    let _log_guard = logging::init(server_config.log_level, server_config.log_dir.as_deref())?;
    if let Some(path) = env_file {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let engine = Arc::new(server_config.build_engine()?);
    let registry = Arc::new(ToolRegistry::with_builtin_tools(
        engine.clone(),
        server_config.using_default_blocklist,
    )?);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            logging::startup(&server_config);
            let handler = Arc::new(ProtocolHandler::new(registry));
            let transport = StdioTransport::new(handler);
            match transport.run().await {
                Ok(()) => logging::shutdown("stdin closed"),
                Err(e) => {
                    logging::shutdown(&format!("error: {e}"));
                    return Err(e.into());
                }
            }
        }

        #[cfg(feature = "http")]
        Commands::ServeHttp { host, port, token } => {
            use agentic_commander_mcp::transport::HttpTransport;

            let addr: std::net::SocketAddr = format!("{host}:{port}")
                .parse()
                .or_else(|_| {
                    std::net::ToSocketAddrs::to_socket_addrs(&(host.as_str(), port))?
                        .next()
                        .ok_or_else(|| {
                            std::io::Error::new(
                                std::io::ErrorKind::AddrNotAvailable,
                                format!("cannot resolve {host}"),
                            )
                        })
                })?;

            // Resolve token: CLI flag > env var
            let effective_token = config::resolve_priority(
                token.as_deref(),
                std::env::var(config::ENV_TOKEN).ok(),
            )
            .map(|(token, _)| token);

            logging::startup(&server_config);
            if effective_token.is_some() {
                tracing::info!("Auth: bearer token required");
            } else if !addr.ip().is_loopback() {
                tracing::warn!("Listening on {addr} without a bearer token");
            }

            let handler = Arc::new(ProtocolHandler::new(registry));
            let transport = HttpTransport::new(handler, effective_token);
            match transport.run(addr).await {
                Ok(()) => logging::shutdown("signal"),
                Err(e) => {
                    logging::shutdown(&format!("error: {e}"));
                    return Err(e.into());
                }
            }
        }

        Commands::Check { command } => {
            let command = command.join(" ");
            match engine.validate(&command) {
                Ok(()) => println!("allowed: {command} (program: {})", command_name(&command)),
                Err(rejection) => {
                    println!("rejected: {command} ({rejection})");
                    std::process::exit(1);
                }
            }
        }

        Commands::Info => {
            let capabilities = agentic_commander_mcp::types::InitializeResult::default_result();
            let tools = registry.list_tools();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(
                shell,
                &mut cmd,
                "agentic-commander-mcp",
                &mut std::io::stdout(),
            );
        }

        Commands::Repl => {
            repl::run(&ReplContext {
                engine: &engine,
                registry: &registry,
            })?;
        }
    }

    Ok(())
}
