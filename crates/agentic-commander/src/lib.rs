//! AgenticCommander — core command engine: allow/block policy, validation, and deadline-bounded shell execution.

pub mod engine;
pub mod executor;
pub mod policy;
mod process;
pub mod types;
pub mod validator;

pub use engine::CommandEngine;
pub use executor::CommandExecutor;
pub use policy::{default_blocked_commands, parse_command_list, Policy};
pub use types::*;
pub use validator::{command_name, validate, Rejection};
