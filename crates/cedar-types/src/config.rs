//! Terminal configuration loaded from TOML.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CedarError, Result};

/// Smallest grid the terminal will shrink to.
pub const MIN_ROWS: usize = 12;
/// Narrowest grid the terminal will shrink to.
pub const MIN_COLS: usize = 40;

/// Runtime configuration for a Cedar terminal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CedarConfig {
    pub user: String,
    pub host: String,
    /// Text drawn after the working directory in the prompt.
    pub prompt_tail: String,
    pub start_cwd: String,
    pub rows: usize,
    pub cols: usize,
    /// Base delay before a submitted line runs.
    pub exec_delay_ms: u64,
    /// Random extra delay added on top of `exec_delay_ms`, inclusive.
    pub exec_delay_jitter_ms: u64,
    /// Materialize a bare root instead of `/home/<user>` and `/apps`.
    pub skip_default_dirs: bool,
    /// Directory for file-backed state. `None` keeps state in memory.
    pub state_dir: Option<PathBuf>,
    /// Run the boot sequence before the first prompt.
    pub boot: bool,
}

impl Default for CedarConfig {
    fn default() -> Self {
        Self {
            user: "guest".to_string(),
            host: "cedar".to_string(),
            prompt_tail: "$ ".to_string(),
            start_cwd: "/".to_string(),
            rows: 25,
            cols: 80,
            exec_delay_ms: 25,
            exec_delay_jitter_ms: 25,
            skip_default_dirs: false,
            state_dir: None,
            boot: true,
        }
    }
}

impl CedarConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| CedarError::Config(format!("cedar.toml: {e}")))
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// `/home/<user>`.
    pub fn home_dir(&self) -> String {
        format!("/home/{}", self.user)
    }
}
