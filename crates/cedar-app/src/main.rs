//! Cedar native entry point.
//!
//! Reads command lines from stdin and feeds them to a terminal as typed
//! input. Every grid flush is redrawn on stdout with ANSI cursor control.
//! The config path comes from the first CLI argument or `CEDAR_CONFIG`.

mod surface;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use cedar_terminal::Terminal;
use cedar_terminal::ports::Ports;
use cedar_types::config::CedarConfig;
use cedar_vfs::{DirStorage, MemoryStorage, Storage};

use surface::AnsiSurface;

/// Caret blink period.
const BLINK_MS: u64 = 520;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    log::info!(
        "Starting Cedar {} ({}x{})",
        cedar_terminal::VERSION,
        config.cols,
        config.rows
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(config))
}

fn load_config() -> Result<CedarConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CEDAR_CONFIG").ok())
        .map(PathBuf::from);
    match path {
        Some(p) => Ok(CedarConfig::load(&p)?),
        None => Ok(CedarConfig::default()),
    }
}

fn open_storage(config: &CedarConfig) -> Result<Box<dyn Storage>> {
    match &config.state_dir {
        Some(dir) => {
            log::info!("Persisting state in {}", dir.display());
            Ok(Box::new(DirStorage::open(dir.clone())?))
        },
        None => Ok(Box::new(MemoryStorage::new())),
    }
}

async fn run(config: CedarConfig) -> Result<()> {
    let storage = open_storage(&config)?;
    let mut term = Terminal::new(
        config,
        storage,
        Ports::default(),
        Box::new(AnsiSurface::stdout()),
    );
    term.power_on().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut blink = tokio::time::interval(Duration::from_millis(BLINK_MS));
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    term.run_line(&line).await;
                },
                None => break,
            },
            _ = blink.tick() => term.tick_blink(),
        }
    }

    log::info!("stdin closed, shutting down");
    term.stop();
    Ok(())
}
