//! Command test harness: a session, filesystem and registry with every
//! built-in, wired to deterministic ports.

use std::sync::Arc;

use cedar_types::clock::{Clock, ManualClock};
use cedar_types::config::CedarConfig;
use cedar_vfs::{FileSystem, FsOptions, MemoryStorage};

use crate::commands::register_builtins;
use crate::interpreter::{CommandRegistry, Environment};
use crate::ports::Ports;
use crate::screen::NullSurface;
use crate::session::Session;

pub struct Harness {
    pub session: Session,
    pub fs: FileSystem,
    pub ports: Ports,
    pub registry: CommandRegistry,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(1_000));
        let shared: Arc<dyn Clock> = Arc::clone(&clock) as Arc<dyn Clock>;
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry);
        Self {
            session: Session::new(&CedarConfig::default(), Box::new(NullSurface)),
            fs: FileSystem::open(
                Box::new(MemoryStorage::new()),
                Arc::clone(&shared),
                FsOptions::default(),
            ),
            ports: Ports::instant(shared),
            registry,
            clock,
        }
    }

    /// Dispatch `line` and return every line it printed.
    pub async fn run(&mut self, line: &str) -> Vec<String> {
        self.session.begin_capture();
        let mut env =
            Environment::new(&mut self.session, &mut self.fs, &self.ports, &self.registry);
        self.registry.execute(line, &mut env).await;
        self.session.end_capture()
    }
}
