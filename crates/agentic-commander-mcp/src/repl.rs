//! Interactive REPL for inspecting the command policy.
//!
//! Launch with `agentic-commander-mcp repl`. Commands can be checked against
//! the resolved policy here; nothing is ever executed.
//! Type `/help` for available commands, Tab for completion.

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};

use agentic_commander::{command_name, format_duration, CommandEngine};

use crate::config::home_dir;
use crate::tools::ToolRegistry;
use crate::types::InitializeResult;

const HISTORY_FILE: &str = ".agentic_commander_history";

/// Available REPL commands.
const COMMANDS: &[(&str, &str)] = &[
    ("/info", "Show server capabilities and tools"),
    ("/tools", "List available MCP tools"),
    ("/policy", "Show allow and block lists"),
    ("/shell", "Show shell and timeouts"),
    ("/check", "Check a command against the policy"),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the REPL"),
];

/// REPL helper for tab completion.
#[derive(Default)]
struct CommanderHelper;

impl Completer for CommanderHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];
        if input.contains(' ') {
            return Ok((pos, Vec::new()));
        }

        let matches: Vec<Pair> = COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(input))
            .map(|(cmd, desc)| Pair {
                display: format!("{cmd:<16} {desc}"),
                replacement: format!("{cmd} "),
            })
            .collect();
        Ok((0, matches))
    }
}

impl Hinter for CommanderHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|(cmd, _)| cmd.starts_with(line) && *cmd != line)
            .map(|(cmd, _)| cmd[line.len()..].to_string())
    }
}

impl Highlighter for CommanderHelper {}
impl Validator for CommanderHelper {}
impl Helper for CommanderHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

/// What the loop should do after one input line.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Print(String),
    Clear,
    Exit,
}

/// Read-only view of the server the REPL describes.
pub struct ReplContext<'a> {
    pub engine: &'a CommandEngine,
    pub registry: &'a ToolRegistry,
}

/// Run the interactive REPL.
pub fn run(ctx: &ReplContext<'_>) -> anyhow::Result<()> {
    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1magentic-commander-mcp v{}\x1b[0m \x1b[90m(policy inspector)\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
    eprintln!(
        "    Press \x1b[36m/\x1b[0m to browse commands, \x1b[90mTab\x1b[0m to complete, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let mut rl: Editor<CommanderHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    rl.set_helper(Some(CommanderHelper));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let hist_path = home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(HISTORY_FILE);
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let prompt = " \x1b[36mcommander>\x1b[0m ";

    loop {
        match rl.readline(prompt) {
            Ok(line) => match execute_line(&line, ctx) {
                Some(Outcome::Print(text)) => eprintln!("{text}"),
                Some(Outcome::Clear) => eprint!("\x1b[2J\x1b[H"),
                Some(Outcome::Exit) => {
                    eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                    break;
                }
                None => {}
            },
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(&hist_path);

    Ok(())
}

fn execute_line(line: &str, ctx: &ReplContext<'_>) -> Option<Outcome> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let input = line.strip_prefix('/').unwrap_or(line);
    if input.is_empty() {
        return Some(Outcome::Print(cmd_help()));
    }

    let (cmd, args) = match input.split_once(' ') {
        Some((cmd, args)) => (cmd, args.trim()),
        None => (input, ""),
    };

    Some(match cmd {
        "exit" | "quit" => Outcome::Exit,
        "help" | "h" | "?" => Outcome::Print(cmd_help()),
        "clear" | "cls" => Outcome::Clear,
        "info" => Outcome::Print(cmd_info(ctx)),
        "tools" => Outcome::Print(cmd_tools(ctx)),
        "policy" => Outcome::Print(cmd_policy(ctx)),
        "shell" => Outcome::Print(cmd_shell(ctx)),
        "check" => Outcome::Print(cmd_check(args, ctx)),
        _ => Outcome::Print(format!(
            "  Unknown command '/{cmd}'. Type /help for commands."
        )),
    })
}

fn cmd_help() -> String {
    let mut out = String::from("\n  Commands:\n\n");
    for (cmd, desc) in COMMANDS {
        out.push_str(&format!("    {cmd:<18} {desc}\n"));
    }
    out.push_str("\n  Tip: /check <command> shows whether the server would run it.\n");
    out
}

fn cmd_info(ctx: &ReplContext<'_>) -> String {
    let capabilities = InitializeResult::default_result();
    format!(
        "\n  Server:   {} v{}\n  Protocol: {}\n  Tools:    {}\n",
        capabilities.server_info.name,
        capabilities.server_info.version,
        capabilities.protocol_version,
        ctx.registry.len()
    )
}

fn cmd_tools(ctx: &ReplContext<'_>) -> String {
    let tools = ctx.registry.list_tools();
    let mut out = format!("\n  {} MCP tools available:\n\n", tools.len());
    for tool in &tools {
        out.push_str(&format!(
            "    {:<28} {}\n",
            tool.name,
            tool.description.as_deref().unwrap_or("")
        ));
    }
    out
}

fn cmd_policy(ctx: &ReplContext<'_>) -> String {
    let policy = ctx.engine.policy();
    let mut out = String::from("\n  Allowed prefixes:\n");
    if policy.allows_all() {
        out.push_str("    (all commands not blocked)\n");
    }
    for pattern in policy.allow_patterns() {
        out.push_str(&format!("    {pattern}\n"));
    }
    out.push_str("\n  Blocked patterns:\n");
    if policy.block_patterns().is_empty() {
        out.push_str("    (none)\n");
    }
    for pattern in policy.block_patterns() {
        out.push_str(&format!("    {pattern}\n"));
    }
    out
}

fn cmd_shell(ctx: &ReplContext<'_>) -> String {
    let executor = ctx.engine.executor();
    format!(
        "\n  Shell:           {}\n  Default timeout: {}\n  Max timeout:     {}\n",
        executor.shell(),
        format_duration(executor.default_timeout()),
        format_duration(executor.max_timeout())
    )
}

fn cmd_check(args: &str, ctx: &ReplContext<'_>) -> String {
    if args.is_empty() {
        return "  Usage: /check <command>".to_string();
    }
    match ctx.engine.validate(args) {
        Ok(()) => format!(
            "  \x1b[32mallowed\x1b[0m  {args}  (program: {})",
            command_name(args)
        ),
        Err(rejection) => format!("  \x1b[31mrejected\x1b[0m {args}  ({rejection})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentic_commander::{ExecutorConfig, Policy};

    fn engine() -> CommandEngine {
        CommandEngine::new(
            Policy::new(["git", "ls"], Vec::<String>::new()).with_default_blocklist(),
            ExecutorConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_check_reports_decision() {
        let engine = engine();
        let registry = ToolRegistry::new();
        let ctx = ReplContext {
            engine: &engine,
            registry: &registry,
        };

        let Some(Outcome::Print(out)) = execute_line("/check git status", &ctx) else {
            panic!("expected output");
        };
        assert!(out.contains("allowed"));
        assert!(out.contains("program: git"));

        let Some(Outcome::Print(out)) = execute_line("/check cat /etc/passwd", &ctx) else {
            panic!("expected output");
        };
        assert!(out.contains("not allowed"));
    }

    #[test]
    fn test_control_commands() {
        let engine = engine();
        let registry = ToolRegistry::new();
        let ctx = ReplContext {
            engine: &engine,
            registry: &registry,
        };
        assert_eq!(execute_line("   ", &ctx), None);
        assert_eq!(execute_line("/exit", &ctx), Some(Outcome::Exit));
        assert_eq!(execute_line("/clear", &ctx), Some(Outcome::Clear));
        assert!(matches!(
            execute_line("/bogus", &ctx),
            Some(Outcome::Print(out)) if out.contains("Unknown command")
        ));
    }

    #[test]
    fn test_policy_listing() {
        let engine = engine();
        let registry = ToolRegistry::new();
        let ctx = ReplContext {
            engine: &engine,
            registry: &registry,
        };
        let out = cmd_policy(&ctx);
        assert!(out.contains("git"));
        assert!(out.contains(&agentic_commander::default_blocked_commands()[0]));
    }
}
