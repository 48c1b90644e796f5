//! Command trait, registry, and dispatch logic.
//!
//! A line is split on `;` into parts that always all run, and each part on
//! `|` into stages that stop at the first failure. Each stage's printed
//! lines become the next stage's stdin.

use std::collections::HashMap;

use async_trait::async_trait;
use cedar_types::error::Result;
use cedar_vfs::FileSystem;

use crate::ports::Ports;
use crate::session::Session;
use crate::system_commands::MAX_SCRIPT_LINES;

/// Shared mutable environment passed to every command.
pub struct Environment<'a> {
    pub session: &'a mut Session,
    pub fs: &'a mut FileSystem,
    pub ports: &'a Ports,
    pub registry: &'a CommandRegistry,
    /// Output of the previous pipeline stage, newline-joined. Empty for the
    /// first stage.
    pub stdin: String,
    /// Number of `cmd run` scripts currently executing.
    pub script_depth: usize,
    /// Script lines this dispatch may still run, shared by every nesting
    /// level.
    pub script_lines_left: usize,
}

impl<'a> Environment<'a> {
    /// A top-level environment with empty stdin and a full script budget.
    pub fn new(
        session: &'a mut Session,
        fs: &'a mut FileSystem,
        ports: &'a Ports,
        registry: &'a CommandRegistry,
    ) -> Self {
        Self {
            session,
            fs,
            ports,
            registry,
            stdin: String::new(),
            script_depth: 0,
            script_lines_left: MAX_SCRIPT_LINES,
        }
    }

    /// Resolve user input against the session's cwd, user and bookmarks.
    pub fn resolve(&self, input: &str) -> String {
        self.fs
            .resolve_path(input, self.session.cwd(), self.session.user())
    }

    pub fn print(&mut self, text: &str) {
        self.session.print_line(text);
    }
}

/// A single executable command.
#[async_trait(?Send)]
pub trait Command {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "cudi \[path\]").
    fn usage(&self) -> &str;

    /// The line `help` prints for this command.
    fn help_line(&self) -> String {
        format!("{:<15} - {}", self.usage(), self.description())
    }

    /// Run the command. Output goes through [`Environment::print`]; an `Err`
    /// is rendered as `<name>: <message>` and fails the stage.
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()>;
}

/// Result of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub name: String,
    pub success: bool,
    /// Lines the stage printed, newline-joined.
    pub output: String,
}

/// Registry of available commands with dispatch.
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    /// Return a sorted list of (name, description) pairs.
    pub fn list_commands(&self) -> Vec<(&str, &str)> {
        let mut cmds: Vec<(&str, &str)> = self
            .commands
            .values()
            .map(|c| (c.name(), c.description()))
            .collect();
        cmds.sort_by_key(|(name, _)| *name);
        cmds
    }

    /// `help` lines sorted by command name.
    pub fn help_lines(&self) -> Vec<String> {
        let mut cmds: Vec<&dyn Command> = self.commands.values().map(|c| c.as_ref()).collect();
        cmds.sort_by(|a, b| a.name().cmp(b.name()));
        cmds.into_iter().map(|c| c.help_line()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Parse and execute a command line, returning one outcome per stage
    /// that ran.
    ///
    /// A failed stage skips the rest of its `|` pipeline; `;` parts after it
    /// still run. `env.stdin` is restored once the line is done.
    pub async fn execute(&self, line: &str, env: &mut Environment<'_>) -> Vec<StageOutcome> {
        let mut outcomes = Vec::new();
        if line.trim().is_empty() {
            return outcomes;
        }

        let saved_stdin = std::mem::take(&mut env.stdin);
        for part in split_sequence(line) {
            let mut stdin = String::new();
            for stage in split_pipes(&part) {
                env.stdin = std::mem::take(&mut stdin);
                let outcome = self.execute_stage(&stage, env).await;
                let ok = outcome.success;
                stdin.clone_from(&outcome.output);
                outcomes.push(outcome);
                if !ok {
                    break;
                }
            }
        }
        env.stdin = saved_stdin;
        outcomes
    }

    /// Execute one pipeline stage with output capture.
    async fn execute_stage(&self, stage: &str, env: &mut Environment<'_>) -> StageOutcome {
        let tokens = tokenize(stage);
        let Some((name, args)) = tokens.split_first() else {
            return StageOutcome {
                name: String::new(),
                success: true,
                output: String::new(),
            };
        };

        let Some(cmd) = self.commands.get(name.as_str()) else {
            log::debug!("Unknown command `{name}`");
            env.print(&format!("{name}: command not found"));
            return StageOutcome {
                name: name.clone(),
                success: false,
                output: String::new(),
            };
        };

        log::debug!("Dispatching `{name}` with {} args", args.len());
        env.session.begin_capture();
        let result = cmd.execute(args, env).await;
        let output = env.session.end_capture().join("\n");

        let success = match result {
            Ok(()) => true,
            Err(e) => {
                env.print(&format!("{name}: {e}"));
                false
            },
        };
        StageOutcome {
            name: name.clone(),
            success,
            output,
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tokenizer: double quotes only.
// ---------------------------------------------------------------------------

/// Split a stage into tokens on whitespace.
///
/// A `"` toggles quoting and is dropped; whitespace inside quotes is kept.
/// There are no escapes, and an unterminated quote runs to the end.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            },
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

// ---------------------------------------------------------------------------
// Sequence and pipe splitting
// ---------------------------------------------------------------------------

/// Split on `sep` outside double quotes. Parts are trimmed and empty parts
/// dropped.
fn split_unquoted(input: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
        }
        if ch == sep && !in_quotes {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    parts.push(current);

    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split a line into its `;`-separated parts.
pub fn split_sequence(line: &str) -> Vec<String> {
    split_unquoted(line, ';')
}

/// Split a part into its `|`-separated stages.
pub fn split_pipes(part: &str) -> Vec<String> {
    split_unquoted(part, '|')
}
