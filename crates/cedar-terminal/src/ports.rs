//! Host services the terminal and its commands call out to.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cedar_types::clock::{Clock, SystemClock};
use cedar_types::error::{CedarError, Result};

use crate::boot::{BootSequence, NoBoot};

/// Suspends the current command for a while.
#[async_trait(?Send)]
pub trait Sleeper {
    async fn sleep(&self, ms: u64);
}

/// Real delays on the tokio timer.
#[derive(Debug, Default)]
pub struct TokioSleeper;

#[async_trait(?Send)]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Returns immediately and records every requested delay. Clones share
/// the record.
#[derive(Debug, Default, Clone)]
pub struct InstantSleeper {
    requested: Rc<RefCell<Vec<u64>>>,
}

impl InstantSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested(&self) -> Vec<u64> {
        self.requested.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, ms: u64) {
        self.requested.borrow_mut().push(ms);
    }
}

/// System clipboard access.
#[async_trait(?Send)]
pub trait Clipboard {
    async fn write_text(&self, text: &str) -> Result<()>;

    /// The clipboard text, `None` when the clipboard is empty.
    async fn read_text(&self) -> Result<Option<String>>;
}

/// A process-local clipboard.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: RefCell<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        Self {
            text: RefCell::new(Some(text.to_string())),
        }
    }
}

#[async_trait(?Send)]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        *self.text.borrow_mut() = Some(text.to_string());
        Ok(())
    }

    async fn read_text(&self) -> Result<Option<String>> {
        Ok(self.text.borrow().clone())
    }
}

/// A clipboard the host refuses access to.
#[derive(Debug, Default)]
pub struct DeniedClipboard;

#[async_trait(?Send)]
impl Clipboard for DeniedClipboard {
    async fn write_text(&self, _text: &str) -> Result<()> {
        Err(CedarError::Host("clipboard access denied".to_string()))
    }

    async fn read_text(&self) -> Result<Option<String>> {
        Err(CedarError::Host("clipboard access denied".to_string()))
    }
}

/// Every host service a command may reach.
pub struct Ports {
    pub sleeper: Box<dyn Sleeper>,
    pub clipboard: Box<dyn Clipboard>,
    pub boot: Box<dyn BootSequence>,
    pub clock: Arc<dyn Clock>,
}

impl Ports {
    /// Deterministic ports: no delays, empty clipboard, no boot log.
    pub fn instant(clock: Arc<dyn Clock>) -> Self {
        Self {
            sleeper: Box::new(InstantSleeper::new()),
            clipboard: Box::new(MemoryClipboard::new()),
            boot: Box::new(NoBoot),
            clock,
        }
    }
}

impl Default for Ports {
    fn default() -> Self {
        Self {
            sleeper: Box::new(TokioSleeper),
            clipboard: Box::new(MemoryClipboard::new()),
            boot: Box::new(crate::boot::ScriptedBoot::default()),
            clock: Arc::new(SystemClock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn instant_sleeper_records() {
        let s = InstantSleeper::new();
        s.sleep(25).await;
        s.sleep(40).await;
        assert_eq!(s.requested(), vec![25, 40]);
    }

    #[tokio::test]
    async fn memory_clipboard_roundtrip() {
        let c = MemoryClipboard::new();
        assert_eq!(c.read_text().await.unwrap(), None);
        c.write_text("hello").await.unwrap();
        assert_eq!(c.read_text().await.unwrap().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn denied_clipboard_is_host_error() {
        let c = DeniedClipboard;
        let err = c.write_text("x").await.unwrap_err();
        assert_eq!(err.to_string(), "clipboard access denied");
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_sleeper_waits() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(500).await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }
}
