//! Cosmetic boot log shown before the first prompt and on reboot.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ports::{Ports, Sleeper};
use crate::session::Session;
use crate::{BUILD, KERNEL, VERSION};

/// Produces the boot log through the session while input is gated.
#[async_trait(?Send)]
pub trait BootSequence {
    async fn run(&self, session: &mut Session, sleeper: &dyn Sleeper, reboot: bool);
}

/// Prints nothing.
#[derive(Debug, Default)]
pub struct NoBoot;

#[async_trait(?Send)]
impl BootSequence for NoBoot {
    async fn run(&self, _session: &mut Session, _sleeper: &dyn Sleeper, _reboot: bool) {}
}

/// Wipe the screen, then run the boot sequence in boot mode.
///
/// The session is left stopped; callers start it afterwards.
pub async fn run_boot(session: &mut Session, ports: &Ports, reboot: bool) {
    log::info!("{}", if reboot { "Rebooting" } else { "Booting" });
    session.reset_hard();
    session.set_boot_mode(true);
    ports.boot.run(session, ports.sleeper.as_ref(), reboot).await;
    session.set_boot_mode(false);
}

/// Timestamp format of boot log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogStyle {
    /// `[HH:MM:SS]` local wall time.
    #[default]
    Wall,
    /// `[   0.123]` seconds since power on.
    Uptime,
}

struct Step {
    msg: String,
    /// Simulated time that passes in the log.
    dt_ms: u64,
    /// Real pause before the line is printed.
    wait_ms: u64,
    jitter_ms: u64,
    chance: f64,
    burst: bool,
}

fn step(msg: impl Into<String>, dt_ms: u64, wait_ms: u64, jitter_ms: u64) -> Step {
    Step {
        msg: msg.into(),
        dt_ms,
        wait_ms,
        jitter_ms,
        chance: 1.0,
        burst: false,
    }
}

impl Step {
    fn burst(mut self) -> Self {
        self.burst = true;
        self
    }

    fn chance(mut self, chance: f64) -> Self {
        self.chance = chance;
        self
    }
}

/// Simulated boot clock that advances with the log, not with real time.
struct BootClock {
    style: LogStyle,
    base_ms: i64,
    uptime_ms: u64,
}

impl BootClock {
    fn tick(&mut self, ms: u64) {
        self.uptime_ms += ms;
    }

    fn stamp(&self) -> String {
        match self.style {
            LogStyle::Uptime => format!("[{:>8.3}]", self.uptime_ms as f64 / 1000.0),
            LogStyle::Wall => {
                let ms = self.base_ms + self.uptime_ms as i64;
                let t = chrono::DateTime::from_timestamp_millis(ms)
                    .map(|t| t.with_timezone(&chrono::Local))
                    .map_or_else(|| "--:--:--".to_string(), |t| t.format("%H:%M:%S").to_string());
                format!("[{t}]")
            },
        }
    }
}

/// The default boot log: banner, seeded pseudo-random kernel/service/net
/// steps, closing banner.
#[derive(Debug, Clone)]
pub struct ScriptedBoot {
    /// Fixed seed for a repeatable log; `None` seeds from the wall clock.
    pub seed: Option<u64>,
    pub style: LogStyle,
    /// Multiplier on every real pause. Reboots run at 0.65 of this.
    pub speed: f64,
    pub allow_warnings: bool,
}

impl Default for ScriptedBoot {
    fn default() -> Self {
        Self {
            seed: None,
            style: LogStyle::Wall,
            speed: 1.0,
            allow_warnings: true,
        }
    }
}

impl ScriptedBoot {
    fn steps(rng: &mut StdRng, reboot: bool, allow_warnings: bool) -> Vec<Step> {
        let cores = rng.gen_range(2..=12);
        let devices = rng.gen_range(2..=7);
        let hz = [100, 250, 300, 1000][rng.gen_range(0..4)];
        let preempt = if rng.gen_bool(0.75) { "on" } else { "off" };
        let ip = format!("10.0.0.{}", rng.gen_range(20..=220));
        let gw = "10.0.0.1";

        vec![
            step("init: cedar-init starting", 20, 25, 30).burst(),
            step("mem: ok", 12, 20, 40).burst(),
            step(format!("cpu: cores detected: {cores}"), 12, 18, 40).burst(),
            step(format!("sched: tick={hz}hz preempt={preempt}"), 10, 18, 40).burst(),
            step("vfs: mounting / (ramfs)", 14, 22, 60).burst(),
            step("vfs: mounting /proc", 8, 16, 40).burst(),
            step("vfs: mounting /tmp (tmpfs)", 10, 18, 50).burst(),
            step("dev: enumerating devices", 18, 28, 80).burst(),
            step("usb: device descriptor read/64, error -71", 8, 18, 40)
                .burst()
                .chance(if allow_warnings { 0.08 } else { 0.0 }),
            step(format!("dev: bus=pci scan done ({devices} devices)"), 35, 55, 90),
            step("clock: rtc sync ok", 10, 18, 50).burst(),
            step("fsck: / clean", 12, 22, 60).burst(),
            step("vfs: cleanly unmounted old root", 10, 22, 40)
                .burst()
                .chance(if reboot { 0.6 } else { 0.0 }),
            step("sec: policies loaded", 18, 30, 70),
            step("tty: cedar-tty0 attached", 12, 24, 60).burst(),
            step("svc: starting cedar-logd", 18, 35, 90),
            step("svc: cedar-logd: ready", 12, 22, 60).burst(),
            step("net: lo up", 8, 16, 40).burst(),
            step("net: dhcp: requesting lease", 45, 140, 220),
            step(format!("net: dhcp: lease acquired {ip}/24"), 18, 35, 90),
            step(format!("net: route: default via {gw}"), 12, 22, 70).burst(),
            step("ui: starting terminal session", 20, 55, 140),
            step("ui: preparing prompt...", 20, 70, 180),
            step("ui: terminal ready", 10, 30, 90),
        ]
    }
}

#[async_trait(?Send)]
impl BootSequence for ScriptedBoot {
    async fn run(&self, session: &mut Session, sleeper: &dyn Sleeper, reboot: bool) {
        let speed = if reboot { self.speed * 0.65 } else { self.speed };
        let scaled = |ms: u64| (ms as f64 * speed) as u64;
        let seed = self
            .seed
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis() as u64);
        let mut rng = StdRng::seed_from_u64(seed);

        session.print_line("Cedar");
        session.print_line(&format!("version {VERSION} ({BUILD})"));
        session.print_line(&format!("kernel  {KERNEL}"));
        session.print_line("");

        if reboot {
            session.print_line("[reboot] syncing state...");
            sleeper.sleep(scaled(180)).await;
            session.print_line("[reboot] restarting services...");
            sleeper.sleep(scaled(200)).await;
        } else {
            session.print_line("[boot] power on self-test...");
            sleeper.sleep(scaled(rng.gen_range(320..=780))).await;
        }
        session.print_line("");

        let mut clock = BootClock {
            style: self.style,
            base_ms: chrono::Utc::now().timestamp_millis() - rng.gen_range(0..2_500),
            uptime_ms: rng.gen_range(15..=120),
        };
        for s in Self::steps(&mut rng, reboot, self.allow_warnings) {
            if rng.gen_range(0.0..1.0) >= s.chance {
                continue;
            }
            let jitter = rng.gen_range(0..=s.jitter_ms);
            let wait = if s.burst && rng.gen_bool(0.7) {
                rng.gen_range(0..=12)
            } else {
                scaled(s.wait_ms + jitter)
            };
            if wait > 0 {
                sleeper.sleep(wait).await;
            }
            clock.tick(wait + s.dt_ms);
            session.print_line(&format!("{} {}", clock.stamp(), s.msg));
        }

        session.print_line("");
        session.print_line(&format!("Cedar {VERSION} ({BUILD})"));
        session.print_line("");
        session.print_line("Type `help` to list commands.");
        session.print_line("Ctrl+L: clear | Ctrl+Alt+R: reboot");
        session.print_line("");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::InstantSleeper;
    use crate::screen::RecordingSurface;
    use cedar_types::config::CedarConfig;

    fn session() -> (Session, RecordingSurface) {
        let rec = RecordingSurface::new();
        let config = CedarConfig {
            rows: 80,
            cols: 80,
            ..CedarConfig::default()
        };
        (Session::new(&config, Box::new(rec.clone())), rec)
    }

    fn seeded() -> ScriptedBoot {
        ScriptedBoot {
            seed: Some(7),
            style: LogStyle::Uptime,
            ..ScriptedBoot::default()
        }
    }

    #[tokio::test]
    async fn banner_and_closing_lines() {
        let (mut s, rec) = session();
        let sleeper = InstantSleeper::new();
        seeded().run(&mut s, &sleeper, false).await;
        let lines = rec.text_lines();
        assert_eq!(lines[0], "Cedar");
        assert!(lines.iter().any(|l| l == "[boot] power on self-test..."));
        assert!(lines.iter().any(|l| l.ends_with("ui: terminal ready")));
        assert!(lines.iter().any(|l| l == "Type `help` to list commands."));
        assert!(!sleeper.requested().is_empty());
    }

    #[tokio::test]
    async fn reboot_prints_reboot_lines() {
        let (mut s, rec) = session();
        seeded().run(&mut s, &InstantSleeper::new(), true).await;
        let lines = rec.text_lines();
        assert!(lines.iter().any(|l| l == "[reboot] syncing state..."));
        assert!(!lines.iter().any(|l| l.contains("self-test")));
    }

    #[tokio::test]
    async fn same_seed_same_log() {
        let (mut a, rec_a) = session();
        let (mut b, rec_b) = session();
        seeded().run(&mut a, &InstantSleeper::new(), false).await;
        seeded().run(&mut b, &InstantSleeper::new(), false).await;
        assert_eq!(rec_a.text_lines(), rec_b.text_lines());
    }

    #[tokio::test]
    async fn uptime_stamps_are_monotonic() {
        let (mut s, rec) = session();
        seeded().run(&mut s, &InstantSleeper::new(), false).await;
        let stamps: Vec<f64> = rec
            .text_lines()
            .iter()
            .filter_map(|l| l.strip_prefix('['))
            .filter_map(|l| l.split(']').next())
            .filter_map(|t| t.trim().parse().ok())
            .collect();
        assert!(stamps.len() > 10);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn run_boot_gates_and_releases() {
        let (mut s, _rec) = session();
        s.start();
        let ports = Ports::instant(std::sync::Arc::new(cedar_types::clock::ManualClock::new(0)));
        run_boot(&mut s, &ports, true).await;
        assert!(!s.is_running());
        assert!(!s.is_boot_mode());
        assert_eq!(s.out_row(), 0);
    }
}
