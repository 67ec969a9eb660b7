//! Boot sequence and render loop.
//!
//! Five periodic activities share one module: the heartbeat, stat
//! sampling, peripheral sampling, the clock and the uptime push. They run
//! on a single task as branches of one `select!`, so each runs to
//! completion before any other starts and a command can never overlap a
//! heartbeat or another command. Interleaving only happens between turns.
//!
//! A pending transcript scroll is performed at the start of the turn after
//! the one that appended, once that turn's mutations have all landed.

use crate::config::{HostConfig, TimerConfig};
use crate::dispatch::{Dispatch, dispatch};
use crate::error::Result;
use crate::io::{truncate_to_bytes, write_file};
use crate::module::{ComputeModule, Export};
use crate::probe::HostProbe;
use crate::render::{Surface, clock::render_local_clock, format_uptime};
use crate::session::Session;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Longest locale string pushed to the module, in bytes.
const MAX_LOCALE_BYTES: usize = 31;

/// Clamps a host metric into a setter argument.
fn to_arg<T: TryInto<i32>>(value: T) -> i32 {
    value.try_into().unwrap_or(i32::MAX)
}

/// Creates an interval whose first tick is one period from now.
fn ticker(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

/// Drives a [`Session`] through boot and the periodic loop.
#[derive(Debug)]
pub struct Scheduler<M, S, P> {
    session: Session<M, S>,
    probe: P,
    timers: TimerConfig,
    boot_command: Option<String>,
    snapshot: Option<PathBuf>,
}

impl<M: ComputeModule, S: Surface, P: HostProbe> Scheduler<M, S, P> {
    /// Creates a scheduler for a session.
    #[must_use]
    pub fn new(session: Session<M, S>, probe: P, config: &HostConfig) -> Self {
        Self {
            session,
            probe,
            timers: config.timers,
            boot_command: config.boot_command.clone(),
            snapshot: config.snapshot.clone(),
        }
    }

    /// Overrides the command run at the end of boot.
    #[must_use]
    pub fn with_boot_command(mut self, command: Option<String>) -> Self {
        self.boot_command = command;
        self
    }

    /// Overrides the snapshot path.
    #[must_use]
    pub fn with_snapshot(mut self, path: Option<PathBuf>) -> Self {
        self.snapshot = path;
        self
    }

    /// The session.
    pub const fn session(&self) -> &Session<M, S> {
        &self.session
    }

    /// The session, mutably.
    pub const fn session_mut(&mut self) -> &mut Session<M, S> {
        &mut self.session
    }

    /// Runs the one-shot boot sequence.
    ///
    /// Initializes the module, pushes the once-only stats and the battery,
    /// draws the prompt and the clock, then runs the boot command.
    ///
    /// # Errors
    ///
    /// Returns an error if `init_system` traps. A module without
    /// `init_system` boots anyway.
    pub fn boot(&mut self) -> Result<()> {
        if self.session.module().has_export(Export::Initialize) {
            self.session.module_mut().invoke(Export::Initialize)?;
            self.session.apply_clear_request();
        } else {
            tracing::warn!("module has no init_system, skipping initialization");
        }

        self.push_once_stats();
        self.sample_peripherals();
        self.session.render_prompt();
        self.render_clock();
        tracing::info!("boot complete");

        if let Some(command) = self.boot_command.clone() {
            self.submit(&command);
        }
        Ok(())
    }

    fn push_once_stats(&mut self) {
        let module = self.session.module_mut();
        if let Some((width, height)) = self.probe.viewport() {
            module.push(Export::SetWindowWidth, to_arg(width));
            module.push(Export::SetWindowHeight, to_arg(height));
        }
        if let Some(cores) = self.probe.cores() {
            module.push(Export::SetCores, to_arg(cores));
        }
        if let Some(ram) = self.probe.ram_gib() {
            module.push(Export::SetRam, to_arg(ram));
        }
        if let Some(locale) = self.probe.locale() {
            self.push_string(Export::SetTerminal, truncate_to_bytes(&locale, MAX_LOCALE_BYTES));
        }
    }

    /// Writes `text` to the input slot and hands its pointer to `setter`.
    fn push_string(&mut self, setter: Export, text: &str) {
        if !self.session.module().has_export(setter) {
            tracing::trace!(export = setter.name(), "setter not exported, skipping");
            return;
        }
        let view = *self.session.view();
        let module = self.session.module_mut();
        match view.write_cstring(module, text) {
            Ok(ptr) => {
                module.push(setter, to_arg(ptr));
            }
            Err(e) => tracing::warn!(export = setter.name(), error = %e, "string push failed"),
        }
    }

    /// Runs a command line through the dispatcher.
    ///
    /// Failures are logged and reported as [`Dispatch::Silent`]; the loop
    /// carries on.
    pub fn submit(&mut self, line: &str) -> Dispatch {
        match dispatch(&mut self.session, line) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "command failed");
                Dispatch::Silent
            }
        }
    }

    /// Advances the module one tick, appends any output, then redraws the
    /// status frame and the memory dump, in that order.
    pub fn heartbeat(&mut self) {
        if self.session.module().has_export(Export::Tick) {
            match self.tick_output() {
                Ok(output) => {
                    self.session.append_output(output);
                }
                Err(e) => tracing::warn!(error = %e, "heartbeat failed"),
            }
        }
        self.session.render_frame();
        self.session.render_hexdump();
    }

    fn tick_output(&mut self) -> Result<String> {
        self.session.module_mut().invoke(Export::Tick)?;
        self.session.apply_clear_request();
        if !self.session.module().has_export(Export::OutputSlot) {
            return Ok(String::new());
        }
        let view = *self.session.view();
        view.read_output(self.session.module_mut())
    }

    /// Pushes frequently changing host metrics.
    pub fn sample_stats(&mut self) {
        if let Some(bytes) = self.probe.memory_usage() {
            self.session
                .module_mut()
                .push(Export::SetMemoryUsage, to_arg(bytes));
        }
    }

    /// Pushes slowly changing peripheral metrics.
    pub fn sample_peripherals(&mut self) {
        if let Some(percent) = self.probe.battery_percent() {
            self.session
                .module_mut()
                .push(Export::SetBattery, to_arg(percent));
        }
    }

    /// Redraws the clock and rewrites the snapshot, if one is configured.
    pub fn render_clock(&mut self) {
        self.session.surface_mut().set_clock(render_local_clock());
        self.write_snapshot();
    }

    fn write_snapshot(&self) {
        let Some(path) = &self.snapshot else {
            return;
        };
        if let Some(document) = self.session.surface().snapshot()
            && let Err(e) = write_file(path, &document)
        {
            tracing::warn!(path = %path.display(), error = %e, "snapshot write failed");
        }
    }

    /// Pushes the formatted time since boot.
    pub fn push_uptime(&mut self) {
        let uptime = format_uptime(self.session.uptime());
        self.push_string(Export::SetUptime, &uptime);
    }

    /// Runs the periodic loop until the command channel closes.
    ///
    /// Each timer first fires one period after the loop starts. Ticks
    /// missed while another activity ran are skipped, not replayed.
    pub async fn run(mut self, mut commands: mpsc::Receiver<String>) -> Self {
        let mut heartbeat = ticker(self.timers.heartbeat());
        let mut stats = ticker(self.timers.stats());
        let mut peripherals = ticker(self.timers.battery());
        let mut clock = ticker(self.timers.clock());
        let mut uptime = ticker(self.timers.uptime());

        loop {
            self.session.flush_scroll();
            tokio::select! {
                command = commands.recv() => match command {
                    Some(line) => {
                        self.submit(&line);
                    }
                    None => break,
                },
                _ = heartbeat.tick() => self.heartbeat(),
                _ = stats.tick() => self.sample_stats(),
                _ = peripherals.tick() => self.sample_peripherals(),
                _ = clock.tick() => self.render_clock(),
                _ = uptime.tick() => self.push_uptime(),
            }
        }

        self.session.flush_scroll();
        tracing::info!("command source closed, loop stopped");
        self
    }
}
