//! Error types for Cedar.
//!
//! Every error ends up as a single line of terminal output, so the `Display`
//! text of each variant is what the user reads after `<command>: `.

use std::io;

/// Filesystem resolution and mutation failures.
///
/// The messages are user-visible and kept short.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VfsError {
    #[error("no such directory")]
    NoSuchDirectory,

    #[error("no such file")]
    NoSuchFile,

    #[error("exists")]
    Exists,

    #[error("not a directory")]
    NotADirectory,

    #[error("is a directory")]
    IsADirectory,

    #[error("directory not empty")]
    NotEmpty,

    #[error("no such source")]
    NoSuchSource,

    #[error("no such destination directory")]
    NoSuchDestination,

    #[error("cannot remove root")]
    RemoveRoot,

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Errors produced by Cedar.
#[derive(Debug, thiserror::Error)]
pub enum CedarError {
    #[error(transparent)]
    Vfs(#[from] VfsError),

    #[error("{0}")]
    Command(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Host(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CedarError {
    /// Shorthand for a command usage or argument failure.
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CedarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vfs_error_is_bare_message() {
        let e: CedarError = VfsError::Exists.into();
        assert_eq!(format!("{e}"), "exists");
    }

    #[test]
    fn vfs_messages() {
        assert_eq!(VfsError::NoSuchDirectory.to_string(), "no such directory");
        assert_eq!(VfsError::NotEmpty.to_string(), "directory not empty");
        assert_eq!(VfsError::IsADirectory.to_string(), "is a directory");
        assert_eq!(
            VfsError::NoSuchDestination.to_string(),
            "no such destination directory"
        );
        assert_eq!(
            VfsError::InvalidPath("/".into()).to_string(),
            "invalid path: /"
        );
    }

    #[test]
    fn command_error_display() {
        let e = CedarError::command("missing file");
        assert_eq!(format!("{e}"), "missing file");
    }

    #[test]
    fn storage_error_display() {
        let e = CedarError::Storage("quota exceeded".into());
        assert_eq!(format!("{e}"), "storage error: quota exceeded");
    }

    #[test]
    fn config_error_display() {
        let e = CedarError::Config("bad key".into());
        assert_eq!(format!("{e}"), "config error: bad key");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: CedarError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let toml_err = toml::from_str::<toml::Value>("this is [[[not valid toml").unwrap_err();
        let e: CedarError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn json_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let e: CedarError = json_err.into();
        assert!(format!("{e}").contains("JSON error"));
    }

    #[test]
    fn vfs_variant_matches() {
        let e: CedarError = VfsError::NotEmpty.into();
        assert!(matches!(e, CedarError::Vfs(VfsError::NotEmpty)));
    }
}
