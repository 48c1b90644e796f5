//! Foundation types for Cedar.
//!
//! This crate holds the pieces every other Cedar crate agrees on: the error
//! taxonomy, key events fed to the line editor, the clock port used for file
//! timestamps, and the TOML configuration.

pub mod clock;
pub mod config;
pub mod error;
pub mod input;
