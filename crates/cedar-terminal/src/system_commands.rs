//! Scripting, clipboard and lifecycle commands: cmd, clip, paste, reboot,
//! reset.

use async_trait::async_trait;
use cedar_types::error::{CedarError, Result};

use crate::boot::run_boot;
use crate::interpreter::{Command, CommandRegistry, Environment};

/// Deepest `cmd run` nesting allowed.
pub const MAX_SCRIPT_DEPTH: usize = 8;
/// Most script lines one dispatched line may run, counted across every
/// nested `cmd run`. Also the longest script accepted.
pub const MAX_SCRIPT_LINES: usize = 1000;

pub fn register_system_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(CmdCmd));
    reg.register(Box::new(ClipCmd));
    reg.register(Box::new(PasteCmd));
    reg.register(Box::new(RebootCmd));
    reg.register(Box::new(ResetCmd));
}

/// Lines of a script that should run: trimmed, non-blank, and not a
/// `#`, `//` or `;` comment.
fn script_lines(src: &str) -> Vec<&str> {
    src.split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| !(l.starts_with('#') || l.starts_with("//") || l.starts_with(';')))
        .collect()
}

// ---------------------------------------------------------------------------
// cmd run
// ---------------------------------------------------------------------------

struct CmdCmd;
#[async_trait(?Send)]
impl Command for CmdCmd {
    fn name(&self) -> &str {
        "cmd"
    }
    fn description(&self) -> &str {
        "execute a script file, one command per line"
    }
    fn usage(&self) -> &str {
        "cmd run <file>"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let file = match args {
            [sub, file, ..] if sub == "run" => file,
            _ => return Err(CedarError::command("usage: cmd run <file>")),
        };
        let path = env.resolve(file);
        let src = env
            .fs
            .read_file(&path)
            .ok_or_else(|| CedarError::command(format!("no such file: {path}")))?;

        if env.script_depth >= MAX_SCRIPT_DEPTH {
            log::warn!("Script nesting limit hit at {path}");
            return Err(CedarError::command(format!(
                "scripts nested deeper than {MAX_SCRIPT_DEPTH}"
            )));
        }
        let lines = script_lines(&src);
        if lines.len() > MAX_SCRIPT_LINES {
            log::warn!("Script {path} has {} lines", lines.len());
            return Err(CedarError::command(format!(
                "script longer than {MAX_SCRIPT_LINES} lines: {path}"
            )));
        }

        log::debug!("Running script {path} ({} lines)", lines.len());
        env.script_depth += 1;
        let result = run_script_lines(&lines, env).await;
        env.script_depth -= 1;
        result
    }
}

/// Dispatch each line, charging it to the shared script budget.
async fn run_script_lines(lines: &[&str], env: &mut Environment<'_>) -> Result<()> {
    let registry = env.registry;
    for raw in lines {
        if env.script_lines_left == 0 {
            log::warn!("Script line budget exhausted");
            return Err(CedarError::command(format!(
                "script line budget of {MAX_SCRIPT_LINES} exhausted"
            )));
        }
        env.script_lines_left -= 1;
        env.session.set_input(raw);
        registry.execute(raw, env).await;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// clip / paste
// ---------------------------------------------------------------------------

struct ClipCmd;
#[async_trait(?Send)]
impl Command for ClipCmd {
    fn name(&self) -> &str {
        "clip"
    }
    fn description(&self) -> &str {
        "copy text to clipboard (or use stdin)"
    }
    fn usage(&self) -> &str {
        "clip [text...]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let text = if args.is_empty() {
            env.stdin.clone()
        } else {
            args.join(" ")
        };
        if text.is_empty() {
            return Err(CedarError::command("missing text"));
        }
        env.ports.clipboard.write_text(&text).await?;
        env.print("copied to clipboard");
        Ok(())
    }
}

struct PasteCmd;
#[async_trait(?Send)]
impl Command for PasteCmd {
    fn name(&self) -> &str {
        "paste"
    }
    fn description(&self) -> &str {
        "read clipboard and insert into current input buffer"
    }
    fn usage(&self) -> &str {
        "paste"
    }
    async fn execute(&self, _args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let text = env
            .ports
            .clipboard
            .read_text()
            .await?
            .ok_or_else(|| CedarError::command("no clipboard data"))?;
        env.session.insert_str(&text);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// reboot / reset
// ---------------------------------------------------------------------------

async fn reboot(env: &mut Environment<'_>) {
    env.session.stop();
    run_boot(env.session, env.ports, true).await;
    env.session.start();
}

struct RebootCmd;
#[async_trait(?Send)]
impl Command for RebootCmd {
    fn name(&self) -> &str {
        "reboot"
    }
    fn description(&self) -> &str {
        "simulate reboot"
    }
    fn usage(&self) -> &str {
        "reboot"
    }
    async fn execute(&self, _args: &[String], env: &mut Environment<'_>) -> Result<()> {
        reboot(env).await;
        Ok(())
    }
}

struct ResetCmd;
#[async_trait(?Send)]
impl Command for ResetCmd {
    fn name(&self) -> &str {
        "reset"
    }
    fn description(&self) -> &str {
        "wipe Cedar state (filesystem, bookmarks) and reboot"
    }
    fn usage(&self) -> &str {
        "reset"
    }
    async fn execute(&self, _args: &[String], env: &mut Environment<'_>) -> Result<()> {
        env.print("reset: wiping Cedar state...");
        env.fs.reset()?;
        reboot(env).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{DeniedClipboard, MemoryClipboard};
    use crate::testing::Harness;

    #[test]
    fn comments_and_blanks_are_skipped() {
        let src = "echo a\r\n\n  # note\n// also\n; too\n  echo b  ";
        assert_eq!(script_lines(src), vec!["echo a", "echo b"]);
    }

    #[tokio::test]
    async fn cmd_run_executes_lines() {
        let mut h = Harness::new();
        h.fs
            .write_file("/s.cmd", "# setup\nmkdir /w\necho done ; where")
            .unwrap();
        assert_eq!(h.run("cmd run /s.cmd").await, vec!["created /w", "done", "/"]);
        assert_eq!(h.session.input(), "echo done ; where");
    }

    #[tokio::test]
    async fn cmd_run_usage_and_missing() {
        let mut h = Harness::new();
        assert_eq!(h.run("cmd").await, vec!["cmd: usage: cmd run <file>"]);
        assert_eq!(h.run("cmd go /s").await, vec!["cmd: usage: cmd run <file>"]);
        assert_eq!(h.run("cmd run /s").await, vec!["cmd: no such file: /s"]);
    }

    #[tokio::test]
    async fn self_recursive_script_stops_at_depth_cap() {
        let mut h = Harness::new();
        h.fs.write_file("/loop", "echo tick\ncmd run /loop").unwrap();
        let out = h.run("cmd run /loop").await;
        let ticks = out.iter().filter(|l| *l == "tick").count();
        assert_eq!(ticks, MAX_SCRIPT_DEPTH);
        assert_eq!(
            out.iter().filter(|l| l.starts_with("cmd: scripts nested")).count(),
            1
        );
    }

    #[tokio::test]
    async fn fan_out_recursion_shares_one_line_budget() {
        let mut h = Harness::new();
        h.fs
            .write_file("/s", "echo t\ncmd run /s\ncmd run /s\ncmd run /s")
            .unwrap();
        let out = h.run("cmd run /s").await;
        let ticks = out.iter().filter(|l| *l == "t").count();
        assert!(ticks > 0 && ticks <= MAX_SCRIPT_LINES);
        let exhausted = out
            .iter()
            .filter(|l| l.starts_with("cmd: script line budget"))
            .count();
        assert!((1..=MAX_SCRIPT_DEPTH + 1).contains(&exhausted));

        // The next dispatch starts with a full budget.
        let again = h.run("cmd run /s").await;
        assert_eq!(again.iter().filter(|l| *l == "t").count(), ticks);
    }

    #[tokio::test]
    async fn oversized_script_is_refused() {
        let mut h = Harness::new();
        let src = "echo x\n".repeat(MAX_SCRIPT_LINES + 1);
        h.fs.write_file("/big", &src).unwrap();
        let out = h.run("cmd run /big").await;
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("cmd: script longer than"));
    }

    #[tokio::test]
    async fn clip_args_and_stdin() {
        let mut h = Harness::new();
        assert_eq!(h.run("clip hello there").await, vec!["copied to clipboard"]);
        let text = h.ports.clipboard.read_text().await.unwrap();
        assert_eq!(text.as_deref(), Some("hello there"));

        h.run("echo piped | clip").await;
        let text = h.ports.clipboard.read_text().await.unwrap();
        assert_eq!(text.as_deref(), Some("piped"));

        assert_eq!(h.run("clip").await, vec!["clip: missing text"]);
    }

    #[tokio::test]
    async fn clip_reports_host_errors() {
        let mut h = Harness::new();
        h.ports.clipboard = Box::new(DeniedClipboard);
        assert_eq!(h.run("clip x").await, vec!["clip: clipboard access denied"]);
        assert_eq!(h.run("paste").await, vec!["paste: clipboard access denied"]);
    }

    #[tokio::test]
    async fn paste_inserts_at_cursor() {
        let mut h = Harness::new();
        h.ports.clipboard = Box::new(MemoryClipboard::with_text("XY"));
        h.session.insert_str("ab");
        h.session.move_cursor(-1);
        assert!(h.run("paste").await.is_empty());
        assert_eq!(h.session.input(), "aXYb");
        assert_eq!(h.session.cursor(), 3);
    }

    #[tokio::test]
    async fn paste_with_empty_clipboard() {
        let mut h = Harness::new();
        assert_eq!(h.run("paste").await, vec!["paste: no clipboard data"]);
    }

    #[tokio::test]
    async fn reboot_restarts_session() {
        let mut h = Harness::new();
        h.session.start();
        h.run("echo before").await;
        h.run("reboot").await;
        assert!(h.session.is_running());
        assert!(!h.session.is_boot_mode());
        assert_eq!(h.session.out_row(), 0);
    }

    #[tokio::test]
    async fn reset_wipes_state() {
        let mut h = Harness::new();
        h.fs.write_file("/junk", "x").unwrap();
        h.fs.add_bookmark("j", "/junk").unwrap();
        assert_eq!(h.run("reset").await, vec!["reset: wiping Cedar state..."]);
        assert!(h.fs.get_node("/junk").is_none());
        assert!(h.fs.list_bookmarks().is_empty());
        assert!(h.fs.get_node("/home/guest").is_some());
        assert!(h.session.is_running());
    }
}
