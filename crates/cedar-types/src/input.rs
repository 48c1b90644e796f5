//! Platform-agnostic key events.
//!
//! Every host maps its native keyboard input to [`KeyEvent`]. The line
//! editor never sees raw platform input.

use serde::{Deserialize, Serialize};

/// A key the line editor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// A printable character.
    Char(char),
    Enter,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

/// Modifier keys held while a key was pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// True when any of ctrl/alt/meta is held.
    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// A single key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A key press with no modifiers.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
        }
    }

    /// A printable character with no modifiers.
    pub fn char(ch: char) -> Self {
        Self::new(Key::Char(ch))
    }

    /// The same key with ctrl held.
    pub fn with_ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    /// The same key with alt held.
    pub fn with_alt(mut self) -> Self {
        self.modifiers.alt = true;
        self
    }

    /// True for Ctrl+L (either case) without alt or meta.
    pub fn is_clear_screen(&self) -> bool {
        self.modifiers.ctrl
            && !self.modifiers.alt
            && !self.modifiers.meta
            && matches!(self.key, Key::Char('l') | Key::Char('L'))
    }

    /// True for Ctrl+Alt+R, the reboot shortcut.
    pub fn is_reboot(&self) -> bool {
        self.modifiers.ctrl
            && self.modifiers.alt
            && matches!(self.key, Key::Char('r') | Key::Char('R'))
    }

    /// The character to insert, if this is an unmodified printable key.
    pub fn printable(&self) -> Option<char> {
        match self.key {
            Key::Char(ch) if !self.modifiers.any() => Some(ch),
            _ => None,
        }
    }
}

impl From<Key> for KeyEvent {
    fn from(key: Key) -> Self {
        Self::new(key)
    }
}
