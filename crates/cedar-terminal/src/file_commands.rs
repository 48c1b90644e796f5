//! File and directory commands: cudi, tree, read, cat, mk, write, mkdir,
//! rmdir, rm, touch, cop, mv, stat, find, seek, du, sum.

use async_trait::async_trait;
use cedar_types::error::{CedarError, Result};
use cedar_vfs::NodeKind;

use crate::interpreter::{Command, CommandRegistry, Environment};

/// Register all file commands.
pub fn register_file_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(CudiCmd));
    reg.register(Box::new(TreeCmd));
    reg.register(Box::new(ReadCmd));
    reg.register(Box::new(CatCmd));
    reg.register(Box::new(MkCmd));
    reg.register(Box::new(WriteCmd));
    reg.register(Box::new(MkdirCmd));
    reg.register(Box::new(RmdirCmd));
    reg.register(Box::new(RmCmd));
    reg.register(Box::new(TouchCmd));
    reg.register(Box::new(CopCmd));
    reg.register(Box::new(MvCmd));
    reg.register(Box::new(StatCmd));
    reg.register(Box::new(FindCmd));
    reg.register(Box::new(SeekCmd));
    reg.register(Box::new(DuCmd));
    reg.register(Box::new(SumCmd));
}

/// Resolve the first argument, or fall back to the cwd.
fn target_or_cwd(args: &[String], env: &Environment<'_>) -> String {
    match args.first() {
        Some(a) => env.resolve(a),
        None => env.session.cwd().to_string(),
    }
}

/// Resolve the first argument, failing with `missing` when absent.
fn required_target(args: &[String], env: &Environment<'_>, missing: &str) -> Result<String> {
    args.first()
        .map(|a| env.resolve(a))
        .ok_or_else(|| CedarError::command(missing))
}

/// Print file content one line per `\n`-separated segment.
fn print_content(env: &mut Environment<'_>, content: &str) {
    for line in content.split('\n') {
        env.print(line);
    }
}

fn format_millis(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|t| t.with_timezone(&chrono::Local))
        .map_or_else(|| ms.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

// ---------------------------------------------------------------------------
// cudi / tree
// ---------------------------------------------------------------------------

struct CudiCmd;
#[async_trait(?Send)]
impl Command for CudiCmd {
    fn name(&self) -> &str {
        "cudi"
    }
    fn description(&self) -> &str {
        "list children of a path (default: current dir)"
    }
    fn usage(&self) -> &str {
        "cudi [path]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let target = target_or_cwd(args, env);
        let entries = env
            .fs
            .readdir(&target)
            .ok_or_else(|| CedarError::command(format!("not a directory: {target}")))?;
        for e in entries {
            let mark = if e.kind == NodeKind::Directory { "/" } else { "" };
            env.print(&format!("{}{mark}", e.name));
        }
        Ok(())
    }
}

struct TreeCmd;
#[async_trait(?Send)]
impl Command for TreeCmd {
    fn name(&self) -> &str {
        "tree"
    }
    fn description(&self) -> &str {
        "recursively print children (default: current dir)"
    }
    fn usage(&self) -> &str {
        "tree [path]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let target = target_or_cwd(args, env);
        let lines = env
            .fs
            .tree_list(&target)
            .ok_or_else(|| CedarError::command(format!("no such path: {target}")))?;
        for l in lines {
            env.print(&l);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// read / cat
// ---------------------------------------------------------------------------

struct ReadCmd;
#[async_trait(?Send)]
impl Command for ReadCmd {
    fn name(&self) -> &str {
        "read"
    }
    fn description(&self) -> &str {
        "print file contents"
    }
    fn usage(&self) -> &str {
        "read [file]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let path = required_target(args, env, "missing file")?;
        let content = env
            .fs
            .read_file(&path)
            .ok_or_else(|| CedarError::command(format!("no such file: {path}")))?;
        print_content(env, &content);
        Ok(())
    }
}

struct CatCmd;
#[async_trait(?Send)]
impl Command for CatCmd {
    fn name(&self) -> &str {
        "cat"
    }
    fn description(&self) -> &str {
        "print file(s) contents, or piped input"
    }
    fn usage(&self) -> &str {
        "cat [file...]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        if args.is_empty() {
            if env.stdin.is_empty() {
                return Err(CedarError::command("missing file"));
            }
            let stdin = env.stdin.clone();
            print_content(env, &stdin);
            return Ok(());
        }
        // Stops at the first missing file; earlier files stay printed.
        for a in args {
            let path = env.resolve(a);
            let content = env
                .fs
                .read_file(&path)
                .ok_or_else(|| CedarError::command(format!("no such file: {path}")))?;
            print_content(env, &content);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// mk / write
// ---------------------------------------------------------------------------

struct MkCmd;
#[async_trait(?Send)]
impl Command for MkCmd {
    fn name(&self) -> &str {
        "mk"
    }
    fn description(&self) -> &str {
        "create file (empty by default)"
    }
    fn usage(&self) -> &str {
        "mk [name.ext]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let path = required_target(args, env, "missing filename")?;
        env.fs.mk(&path)?;
        env.print(&format!("created {path}"));
        Ok(())
    }
}

struct WriteCmd;
#[async_trait(?Send)]
impl Command for WriteCmd {
    fn name(&self) -> &str {
        "write"
    }
    fn description(&self) -> &str {
        "replace one line (use + to append)"
    }
    fn usage(&self) -> &str {
        "write [file] [line] [text...]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let [file, line_arg, rest @ ..] = args else {
            return Err(CedarError::command("usage: write file line text"));
        };
        let path = env.resolve(file);
        let text = rest.join(" ");
        let current = env.fs.read_file(&path).unwrap_or_default();
        let mut lines: Vec<String> = current.split('\n').map(str::to_string).collect();

        if line_arg == "+" {
            lines.push(text);
        } else {
            let n = line_arg
                .parse::<usize>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| CedarError::command("invalid line"))?;
            if lines.len() < n {
                lines.resize(n, String::new());
            }
            lines[n - 1] = text;
        }

        env.fs.write_file(&path, &lines.join("\n"))?;
        env.print(&format!("wrote {path}"));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// mkdir / rmdir / rm / touch
// ---------------------------------------------------------------------------

struct MkdirCmd;
#[async_trait(?Send)]
impl Command for MkdirCmd {
    fn name(&self) -> &str {
        "mkdir"
    }
    fn description(&self) -> &str {
        "create directory"
    }
    fn usage(&self) -> &str {
        "mkdir [dir]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let path = required_target(args, env, "missing directory")?;
        env.fs.mkdir(&path)?;
        env.print(&format!("created {path}"));
        Ok(())
    }
}

struct RmdirCmd;
#[async_trait(?Send)]
impl Command for RmdirCmd {
    fn name(&self) -> &str {
        "rmdir"
    }
    fn description(&self) -> &str {
        "remove empty directory"
    }
    fn usage(&self) -> &str {
        "rmdir [dir]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let path = required_target(args, env, "missing directory")?;
        env.fs.rmdir(&path)?;
        env.print(&format!("removed {path}"));
        Ok(())
    }
}

struct RmCmd;
#[async_trait(?Send)]
impl Command for RmCmd {
    fn name(&self) -> &str {
        "rm"
    }
    fn description(&self) -> &str {
        "remove file"
    }
    fn usage(&self) -> &str {
        "rm [file]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let path = required_target(args, env, "missing file")?;
        env.fs.rm(&path)?;
        env.print(&format!("removed {path}"));
        Ok(())
    }
}

struct TouchCmd;
#[async_trait(?Send)]
impl Command for TouchCmd {
    fn name(&self) -> &str {
        "touch"
    }
    fn description(&self) -> &str {
        "create if missing or update mtime"
    }
    fn usage(&self) -> &str {
        "touch [file]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let path = required_target(args, env, "missing file")?;
        env.fs.touch(&path)?;
        env.print(&format!("touched {path}"));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// cop / mv
// ---------------------------------------------------------------------------

/// Resolve `src dst`, failing with `missing args` when either is absent.
fn src_dst(args: &[String], env: &Environment<'_>) -> Result<(String, String)> {
    match args {
        [src, dst, ..] => Ok((env.resolve(src), env.resolve(dst))),
        _ => Err(CedarError::command("missing args")),
    }
}

struct CopCmd;
#[async_trait(?Send)]
impl Command for CopCmd {
    fn name(&self) -> &str {
        "cop"
    }
    fn description(&self) -> &str {
        "copy file/dir (recursive if dir)"
    }
    fn usage(&self) -> &str {
        "cop [src] [dst]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let (src, dst) = src_dst(args, env)?;
        env.fs.copy(&src, &dst)?;
        env.print(&format!("copied {src} -> {dst}"));
        Ok(())
    }
}

struct MvCmd;
#[async_trait(?Send)]
impl Command for MvCmd {
    fn name(&self) -> &str {
        "mv"
    }
    fn description(&self) -> &str {
        "move/rename"
    }
    fn usage(&self) -> &str {
        "mv [src] [dst]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let (src, dst) = src_dst(args, env)?;
        env.fs.move_node(&src, &dst)?;
        env.print(&format!("moved {src} -> {dst}"));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// stat / du / sum
// ---------------------------------------------------------------------------

struct StatCmd;
#[async_trait(?Send)]
impl Command for StatCmd {
    fn name(&self) -> &str {
        "stat"
    }
    fn description(&self) -> &str {
        "show type, size, timestamps"
    }
    fn usage(&self) -> &str {
        "stat [path]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let path = target_or_cwd(args, env);
        let s = env
            .fs
            .stat(&path)
            .ok_or_else(|| CedarError::command(format!("no such path: {path}")))?;
        env.print(&format!("type: {}", s.kind));
        env.print(&format!("size: {}", s.size));
        env.print(&format!("ctime: {}", format_millis(s.ctime)));
        env.print(&format!("mtime: {}", format_millis(s.mtime)));
        Ok(())
    }
}

struct DuCmd;
#[async_trait(?Send)]
impl Command for DuCmd {
    fn name(&self) -> &str {
        "du"
    }
    fn description(&self) -> &str {
        "total bytes of file content under a path"
    }
    fn usage(&self) -> &str {
        "du [path]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let path = target_or_cwd(args, env);
        if env.fs.get_node(&path).is_none() {
            return Err(CedarError::command(format!("no such path: {path}")));
        }
        let bytes = env.fs.du(&path);
        env.print(&format!("{bytes}  {path}"));
        Ok(())
    }
}

struct SumCmd;
#[async_trait(?Send)]
impl Command for SumCmd {
    fn name(&self) -> &str {
        "sum"
    }
    fn description(&self) -> &str {
        "print a checksum of a file"
    }
    fn usage(&self) -> &str {
        "sum [file]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let path = required_target(args, env, "missing file")?;
        let hash = env
            .fs
            .hash(&path)
            .ok_or_else(|| CedarError::command(format!("no such file: {path}")))?;
        env.print(&format!("{hash}  {path}"));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// find / seek
// ---------------------------------------------------------------------------

struct FindCmd;
#[async_trait(?Send)]
impl Command for FindCmd {
    fn name(&self) -> &str {
        "find"
    }
    fn description(&self) -> &str {
        "search by name"
    }
    fn usage(&self) -> &str {
        "find [name] [path]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let name = args.first().ok_or_else(|| CedarError::command("missing name"))?;
        let path = target_or_cwd(&args[1..], env);
        for p in env.fs.find(name, &path) {
            env.print(&p);
        }
        Ok(())
    }
}

struct SeekCmd;
#[async_trait(?Send)]
impl Command for SeekCmd {
    fn name(&self) -> &str {
        "seek"
    }
    fn description(&self) -> &str {
        "search file contents for text"
    }
    fn usage(&self) -> &str {
        "seek [text] [path]"
    }
    async fn execute(&self, args: &[String], env: &mut Environment<'_>) -> Result<()> {
        let text = args.first().ok_or_else(|| CedarError::command("missing text"))?;
        let path = target_or_cwd(&args[1..], env);
        for p in env.fs.seek(text, &path) {
            env.print(&p);
        }
        Ok(())
    }
}
