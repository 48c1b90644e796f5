//! Bookmark commands: mark, marks, unmark.

use async_trait::async_trait;
use cedar_types::error::{CedarError, Result};

use crate::interpreter::{Command, CommandRegistry, Environment};

pub fn register_bookmark_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(MarkCmd));
    reg.register(Box::new(MarksCmd));
    reg.register(Box::new(UnmarkCmd));
}

struct MarkCmd;
#[async_trait(?Send)]
impl Command for MarkCmd {
    fn name(&self) -> &str {
        "mark"
    }
    fn description(&self) -> &str {
        "create bookmark"
    }
    fn usage(&self) -> &str {
        "mark [name] [path]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let name = args.first().ok_or_else(|| CedarError::command("missing name"))?;
        let path = match args.get(1) {
            Some(p) => env.resolve(p),
            None => env.session.cwd().to_string(),
        };
        env.fs.add_bookmark(name, &path)?;
        env.print(&format!("marked @{name} -> {path}"));
        Ok(())
    }
}

struct MarksCmd;
#[async_trait(?Send)]
impl Command for MarksCmd {
    fn name(&self) -> &str {
        "marks"
    }
    fn description(&self) -> &str {
        "list directory bookmarks"
    }
    fn usage(&self) -> &str {
        "marks"
    }
    async fn execute(&self, _args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let lines: Vec<String> = env
            .fs
            .list_bookmarks()
            .iter()
            .map(|(k, v)| format!("@{k} -> {v}"))
            .collect();
        if lines.is_empty() {
            env.print("(no marks)");
        }
        for l in lines {
            env.print(&l);
        }
        Ok(())
    }
}

struct UnmarkCmd;
#[async_trait(?Send)]
impl Command for UnmarkCmd {
    fn name(&self) -> &str {
        "unmark"
    }
    fn description(&self) -> &str {
        "remove bookmark"
    }
    fn usage(&self) -> &str {
        "unmark [name]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let name = args.first().ok_or_else(|| CedarError::command("missing name"))?;
        env.fs.remove_bookmark(name)?;
        env.print(&format!("removed @{name}"));
        Ok(())
    }
}
