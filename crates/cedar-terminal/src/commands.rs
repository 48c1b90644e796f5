//! Built-in shell commands for the Cedar terminal.

use async_trait::async_trait;
use cedar_types::error::{CedarError, Result};

use crate::interpreter::{Command, CommandRegistry, Environment};
use crate::{BUILD, KERNEL, VERSION};

/// Register all built-in commands into a registry.
pub fn register_builtins(reg: &mut CommandRegistry) {
    reg.register(Box::new(HelpCmd));
    reg.register(Box::new(EchoCmd));
    reg.register(Box::new(ClearCmd));
    reg.register(Box::new(WhereCmd));
    reg.register(Box::new(AboutCmd));
    reg.register(Box::new(CdCmd));
    reg.register(Box::new(BackCmd));
    reg.register(Box::new(JumpCmd));
    crate::file_commands::register_file_commands(reg);
    crate::bookmark_commands::register_bookmark_commands(reg);
    crate::system_commands::register_system_commands(reg);
}

/// Resolve `dest` and require a directory there.
fn resolve_dir(env: &Environment<'_>, dest: &str) -> Result<String> {
    let path = env.resolve(dest);
    match env.fs.get_node(&path) {
        Some(node) if node.is_dir() => Ok(path),
        _ => Err(CedarError::command(format!("no such directory: {dest}"))),
    }
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

struct HelpCmd;
#[async_trait(?Send)]
impl Command for HelpCmd {
    fn name(&self) -> &str {
        "help"
    }
    fn description(&self) -> &str {
        "list commands"
    }
    fn usage(&self) -> &str {
        "help"
    }
    async fn execute(&self, _args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let registry = env.registry;
        env.print("Commands:");
        for line in registry.help_lines() {
            env.print(&format!("  {line}"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// echo
// ---------------------------------------------------------------------------

struct EchoCmd;
#[async_trait(?Send)]
impl Command for EchoCmd {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "print text to the terminal"
    }
    fn usage(&self) -> &str {
        "echo [text...]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        env.print(&args.join(" "));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// clear / where / about
// ---------------------------------------------------------------------------

struct ClearCmd;
#[async_trait(?Send)]
impl Command for ClearCmd {
    fn name(&self) -> &str {
        "clear"
    }
    fn description(&self) -> &str {
        "clear the screen"
    }
    fn usage(&self) -> &str {
        "clear"
    }
    async fn execute(&self, _args: &[String], env: &mut Environment<'_>) -> Result<()> {
        env.session.clear_screen();
        Ok(())
    }
}

struct WhereCmd;
#[async_trait(?Send)]
impl Command for WhereCmd {
    fn name(&self) -> &str {
        "where"
    }
    fn description(&self) -> &str {
        "print the current directory"
    }
    fn usage(&self) -> &str {
        "where"
    }
    async fn execute(&self, _args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let cwd = env.session.cwd().to_string();
        env.print(&cwd);
        Ok(())
    }
}

struct AboutCmd;
#[async_trait(?Send)]
impl Command for AboutCmd {
    fn name(&self) -> &str {
        "about"
    }
    fn description(&self) -> &str {
        "print version/build/kernel info and environment notes"
    }
    fn usage(&self) -> &str {
        "about"
    }
    async fn execute(&self, _args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let user = format!("user: {}@{}", env.session.user(), env.session.host());
        let cwd = format!("cwd: {}", env.session.cwd());
        env.print(&format!("Cedar {VERSION} ({BUILD})"));
        env.print(&format!("kernel: {KERNEL}"));
        env.print(&user);
        env.print(&cwd);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// cd / back / jump
// ---------------------------------------------------------------------------

struct CdCmd;
#[async_trait(?Send)]
impl Command for CdCmd {
    fn name(&self) -> &str {
        "cd"
    }
    fn description(&self) -> &str {
        "change directory (no args -> ~)"
    }
    fn usage(&self) -> &str {
        "cd [path]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let dest = args.first().map_or("~", String::as_str);
        let path = resolve_dir(env, dest)?;
        env.session.change_dir(path);
        Ok(())
    }
}

struct BackCmd;
#[async_trait(?Send)]
impl Command for BackCmd {
    fn name(&self) -> &str {
        "back"
    }
    fn description(&self) -> &str {
        "go to previous directory"
    }
    fn usage(&self) -> &str {
        "back"
    }
    async fn execute(&self, _args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let cwd = env.session.back().to_string();
        env.print(&cwd);
        Ok(())
    }
}

struct JumpCmd;
#[async_trait(?Send)]
impl Command for JumpCmd {
    fn name(&self) -> &str {
        "jump"
    }
    fn description(&self) -> &str {
        "like cd but supports @bookmarks"
    }
    fn usage(&self) -> &str {
        "jump [path|@mark]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let dest = args
            .first()
            .ok_or_else(|| CedarError::command("missing destination"))?;
        let path = resolve_dir(env, dest)?;
        env.print(&format!("jumped to {path}"));
        env.session.change_dir(path);
        Ok(())
    }
}
