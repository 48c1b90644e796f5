//! The assembled terminal: key handling, submit and lifecycle.

use std::sync::Arc;

use cedar_types::config::CedarConfig;
use cedar_types::input::{Key, KeyEvent};
use cedar_vfs::{FileSystem, FsOptions, Storage};
use rand::Rng;

use crate::boot::run_boot;
use crate::commands::register_builtins;
use crate::interpreter::{CommandRegistry, Environment, StageOutcome};
use crate::ports::Ports;
use crate::screen::Surface;
use crate::session::Session;

/// One running terminal instance. Owns its session, filesystem, command
/// registry and host ports.
pub struct Terminal {
    session: Session,
    fs: FileSystem,
    registry: CommandRegistry,
    ports: Ports,
    config: CedarConfig,
}

impl Terminal {
    /// Build a stopped terminal with every built-in command registered.
    pub fn new(
        config: CedarConfig,
        storage: Box<dyn Storage>,
        ports: Ports,
        surface: Box<dyn Surface>,
    ) -> Self {
        let fs = FileSystem::open(
            storage,
            Arc::clone(&ports.clock),
            FsOptions {
                user: config.user.clone(),
                skip_default_dirs: config.skip_default_dirs,
            },
        );
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry);
        log::debug!("Registered {} commands", registry.len());
        Self {
            session: Session::new(&config, surface),
            fs,
            registry,
            ports,
            config,
        }
    }

    /// Run the boot sequence if configured, then start taking input.
    pub async fn power_on(&mut self) {
        if self.config.boot {
            run_boot(&mut self.session, &self.ports, false).await;
        }
        self.session.start();
    }

    pub fn start(&mut self) {
        self.session.start();
    }

    pub fn stop(&mut self) {
        self.session.stop();
    }

    pub fn set_boot_mode(&mut self, on: bool) {
        self.session.set_boot_mode(on);
    }

    /// Stop, run the reboot sequence, start again.
    pub async fn reboot(&mut self) {
        self.session.stop();
        run_boot(&mut self.session, &self.ports, true).await;
        self.session.start();
    }

    /// Feed one key press.
    ///
    /// Ctrl+Alt+R always reboots. Everything else is dropped unless the
    /// session is running, out of boot mode and idle.
    pub async fn handle_key(&mut self, ev: KeyEvent) {
        if ev.is_reboot() {
            self.reboot().await;
            return;
        }
        if !self.session.accepts_input() {
            return;
        }
        if ev.is_clear_screen() {
            self.session.clear_screen();
            self.session.draw_prompt();
            return;
        }

        match ev.key {
            Key::Enter => {
                self.submit().await;
            },
            Key::Backspace => self.session.backspace(),
            Key::Delete => self.session.delete(),
            Key::Left => self.session.move_cursor(-1),
            Key::Right => self.session.move_cursor(1),
            Key::Up => self.session.history_up(),
            Key::Down => self.session.history_down(),
            Key::Home => self.session.home(),
            Key::End => self.session.end(),
            Key::Char(_) => {
                if let Some(ch) = ev.printable() {
                    self.session.insert(ch);
                }
            },
        }
    }

    /// Type each character of `text` as a plain key press.
    pub async fn type_str(&mut self, text: &str) {
        for ch in text.chars() {
            self.handle_key(KeyEvent::char(ch)).await;
        }
    }

    /// Type `line` and press Enter. Returns the outcome of every stage that
    /// ran, or nothing when input is gated.
    pub async fn run_line(&mut self, line: &str) -> Vec<StageOutcome> {
        if !self.session.accepts_input() {
            return Vec::new();
        }
        self.type_str(line).await;
        self.submit().await
    }

    /// Commit the current input, dispatch it, and draw a fresh prompt.
    ///
    /// The prompt is redrawn whatever the stages did, unless a command left
    /// the session stopped.
    pub async fn submit(&mut self) -> Vec<StageOutcome> {
        let line = self.session.commit_input();
        self.session.set_busy(true);

        let jitter = rand::thread_rng().gen_range(0..=self.config.exec_delay_jitter_ms);
        let delay = self.config.exec_delay_ms + jitter;
        if delay > 0 {
            self.ports.sleeper.sleep(delay).await;
        }

        let mut env =
            Environment::new(&mut self.session, &mut self.fs, &self.ports, &self.registry);
        let outcomes = self.registry.execute(&line, &mut env).await;

        self.session.set_busy(false);
        if self.session.is_running() {
            self.session.draw_prompt();
        }
        outcomes
    }

    /// Toggle the caret. Hosts call this on a 520 ms timer.
    pub fn tick_blink(&mut self) {
        self.session.tick_blink();
    }

    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.session.resize(rows, cols);
        if self.session.is_running() {
            self.session.render_input_line();
        }
    }

    pub fn reset_hard(&mut self) {
        self.session.reset_hard();
    }

    pub fn clear_screen(&mut self) {
        self.session.clear_screen();
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn fs(&self) -> &FileSystem {
        &self.fs
    }

    pub fn config(&self) -> &CedarConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::InstantSleeper;
    use crate::screen::NullSurface;
    use cedar_types::clock::ManualClock;
    use cedar_vfs::MemoryStorage;

    fn terminal(config: CedarConfig) -> (Terminal, InstantSleeper) {
        let sleeper = InstantSleeper::new();
        let mut ports = Ports::instant(Arc::new(ManualClock::new(0)));
        ports.sleeper = Box::new(sleeper.clone());
        let t = Terminal::new(
            config,
            Box::new(MemoryStorage::new()),
            ports,
            Box::new(NullSurface),
        );
        (t, sleeper)
    }

    #[tokio::test]
    async fn gated_until_started() {
        let (mut t, _) = terminal(CedarConfig::default());
        t.handle_key(KeyEvent::char('x')).await;
        assert_eq!(t.session().input(), "");
        t.start();
        t.handle_key(KeyEvent::char('x')).await;
        assert_eq!(t.session().input(), "x");
        t.set_boot_mode(true);
        t.handle_key(KeyEvent::char('y')).await;
        assert_eq!(t.session().input(), "x");
    }

    #[tokio::test]
    async fn exec_delay_goes_through_sleeper() {
        let config = CedarConfig {
            exec_delay_ms: 40,
            exec_delay_jitter_ms: 10,
            ..CedarConfig::default()
        };
        let (mut t, sleeper) = terminal(config);
        t.start();
        t.run_line("where").await;
        let waits = sleeper.requested();
        assert_eq!(waits.len(), 1);
        assert!((40..=50).contains(&waits[0]));
    }

    #[tokio::test]
    async fn zero_delay_skips_sleep() {
        let config = CedarConfig {
            exec_delay_ms: 0,
            exec_delay_jitter_ms: 0,
            ..CedarConfig::default()
        };
        let (mut t, sleeper) = terminal(config);
        t.start();
        t.run_line("where").await;
        assert!(sleeper.requested().is_empty());
    }

    #[tokio::test]
    async fn modified_chars_are_not_inserted() {
        let (mut t, _) = terminal(CedarConfig::default());
        t.start();
        t.handle_key(KeyEvent::char('a').with_ctrl()).await;
        t.handle_key(KeyEvent::char('b').with_alt()).await;
        assert_eq!(t.session().input(), "");
    }

    #[tokio::test]
    async fn reboot_shortcut_bypasses_gate() {
        let (mut t, _) = terminal(CedarConfig::default());
        assert!(!t.session().is_running());
        t.handle_key(KeyEvent::char('r').with_ctrl().with_alt()).await;
        assert!(t.session().is_running());
    }

    #[tokio::test]
    async fn power_on_respects_boot_flag() {
        let config = CedarConfig {
            boot: false,
            ..CedarConfig::default()
        };
        let (mut t, _) = terminal(config);
        t.power_on().await;
        assert!(t.session().is_running());
        assert!(t.session().accepts_input());
    }
}
