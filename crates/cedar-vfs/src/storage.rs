//! Persistence port for filesystem and bookmark state.
//!
//! State is stored as opaque string blobs under string keys, the same shape
//! as a browser's session storage.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cedar_types::error::{CedarError, Result};

/// Keyed blob storage.
pub trait Storage {
    /// Fetch a blob. `Ok(None)` when the key is absent.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Store a blob, replacing any previous value.
    fn save(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete a blob. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Storage that lives only as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    blobs: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a key currently holds a blob.
    pub fn contains(&self, key: &str) -> bool {
        self.blobs.contains_key(key)
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.blobs.remove(key);
        Ok(())
    }
}

/// One file per key inside a directory.
///
/// Keys are mapped to file names by replacing anything outside
/// `[A-Za-z0-9_-]` with `_` and adding `.json`.
#[derive(Debug, Clone)]
pub struct DirStorage {
    dir: PathBuf,
}

impl DirStorage {
    /// Use `dir` for state, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl Storage for DirStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CedarError::Storage(format!("{key}: {e}"))),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path_for(key), value)
            .map_err(|e| CedarError::Storage(format!("{key}: {e}")))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CedarError::Storage(format!("{key}: {e}"))),
        }
    }
}
