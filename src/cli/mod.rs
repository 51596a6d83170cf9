//! Line-oriented shell that drives one trip wizard session.

pub mod commands;
pub mod core;
pub mod help;
pub mod io;
pub mod output;
pub mod shell;
pub mod shell_context;

pub use self::core::{CliError, CommandError};
pub use shell::{run_cli, SCRIPT_ENV};
pub use shell_context::{CliMode, Launch, ShellContext};
