//! Terminal session and command subsystem.
//!
//! A [`Terminal`] owns the line editor, the character grid, the filesystem
//! and a registry-based command dispatcher. Commands implement the `Command`
//! trait and are registered by name. Submitted lines are split into `;`
//! sequences and `|` pipelines, and each stage is dispatched through
//! `execute()`.

mod bookmark_commands;
pub mod boot;
mod commands;
mod file_commands;
pub mod history;
mod interpreter;
pub mod ports;
pub mod screen;
pub mod session;
mod system_commands;
mod terminal;

#[cfg(test)]
mod testing;

/// Register bookmark commands (mark, marks, unmark) into a registry.
pub use bookmark_commands::register_bookmark_commands;
/// Register all built-in commands into a registry.
pub use commands::register_builtins;
/// Register file and directory commands into a registry.
pub use file_commands::register_file_commands;
/// A single executable command trait.
pub use interpreter::Command;
/// Registry of available commands with dispatch.
pub use interpreter::CommandRegistry;
/// Shared mutable environment passed to every command.
pub use interpreter::Environment;
/// Result of one dispatched pipeline stage.
pub use interpreter::StageOutcome;
/// Line splitting and tokenizing used by the dispatcher.
pub use interpreter::{split_pipes, split_sequence, tokenize};
/// Register scripting, clipboard and lifecycle commands into a registry.
pub use system_commands::{MAX_SCRIPT_DEPTH, MAX_SCRIPT_LINES, register_system_commands};
/// The assembled terminal.
pub use terminal::Terminal;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const BUILD: &str = "native";
pub const KERNEL: &str = "cedar-kernel 0.1 (ramfs)";
