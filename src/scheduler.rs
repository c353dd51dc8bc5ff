//! Two interval timers driven off one base tick.
//!
//! The base tick is the greatest common divisor of both intervals, so each
//! timer fires exactly on its own period counted from loop start, whether or
//! not the periods divide each other. Ticks sit on the grid `start + k*base`;
//! a tick that overruns skips grid points instead of shifting the grid.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use color_eyre::Result;
use thiserror::Error;
use tracing::{debug, info};

/// Longest uninterrupted sleep; bounds how long a stop request can go unseen.
const SLEEP_SLICE: Duration = Duration::from_millis(200);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("{0} must be greater than 0 seconds")]
    ZeroInterval(&'static str),
}

/// Shared cancellation flag, set from a signal handler and polled by the loop.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a stop had already been requested.
    pub fn request_stop(&self) -> bool {
        self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupt {
    /// Finish the current tick, then stop.
    Graceful,
    /// A stop was already pending; exit now.
    Force,
}

pub fn on_interrupt(stop: &StopFlag) -> Interrupt {
    if stop.request_stop() {
        Interrupt::Force
    } else {
        Interrupt::Graceful
    }
}

pub fn install_interrupt_handler(stop: StopFlag) -> std::result::Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || match on_interrupt(&stop) {
        Interrupt::Force => {
            eprintln!("\nForced exit.");
            std::process::exit(130);
        }
        Interrupt::Graceful => {
            eprintln!("\nStopping after the current tick (Ctrl+C again to force)...");
        }
    })
}

/// Fires every `period` base ticks on a fixed grid of tick indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntervalTimer {
    period: u64,
    next: u64,
}

impl IntervalTimer {
    /// `immediate` fires at tick 0; otherwise the first firing is one full
    /// period in.
    pub fn new(period: u64, immediate: bool) -> Self {
        let period = period.max(1);
        IntervalTimer {
            period,
            next: if immediate { 0 } else { period },
        }
    }

    /// Whether the timer fires at grid index `tick`. Firing points jumped over
    /// since the last call collapse into this one; the next firing stays on
    /// the period grid.
    pub fn fires_at(&mut self, tick: u64) -> bool {
        if tick < self.next {
            return false;
        }
        let behind = (tick - self.next) / self.period;
        self.next += (behind + 1) * self.period;
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub base: Duration,
    pub metrics_every: u64,
    pub advisory_every: u64,
}

impl Schedule {
    pub fn new(interval_secs: u64, ai_interval_secs: u64) -> std::result::Result<Self, ScheduleError> {
        if interval_secs == 0 {
            return Err(ScheduleError::ZeroInterval("interval"));
        }
        if ai_interval_secs == 0 {
            return Err(ScheduleError::ZeroInterval("ai interval"));
        }
        let base = gcd(interval_secs, ai_interval_secs);
        Ok(Schedule {
            base: Duration::from_secs(base),
            metrics_every: interval_secs / base,
            advisory_every: ai_interval_secs / base,
        })
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Work performed when a timer fires.
pub trait Tasks {
    /// Called once per base tick before any timer work.
    fn begin_tick(&mut self) {}
    fn metrics(&mut self) -> Result<()>;
    fn advisory(&mut self) -> Result<()>;
}

pub trait Sleeper {
    /// Marks the grid origin. Called once before the first tick.
    fn begin(&mut self) {}

    /// Wait for the next grid point and return how many base ticks the loop
    /// moved forward (at least 1; more when the previous tick overran).
    fn sleep(&mut self, base: Duration, stop: &StopFlag) -> u64;
}

/// Sleeps toward wall-clock deadlines `origin + k*base`, in slices so a stop
/// request is noticed promptly. Grid points already in the past are skipped.
#[derive(Debug, Default)]
pub struct WallClockSleeper {
    origin: Option<Instant>,
    index: u64,
}

impl Sleeper for WallClockSleeper {
    fn begin(&mut self) {
        self.origin = Some(Instant::now());
        self.index = 0;
    }

    fn sleep(&mut self, base: Duration, stop: &StopFlag) -> u64 {
        let origin = *self.origin.get_or_insert_with(Instant::now);
        if base.is_zero() {
            return 1;
        }

        let elapsed_ticks = (origin.elapsed().as_nanos() / base.as_nanos()) as u64;
        let target = elapsed_ticks.max(self.index) + 1;
        let deadline = origin + base.saturating_mul(u32::try_from(target).unwrap_or(u32::MAX));
        let advanced = target - self.index;
        self.index = target;
        if advanced > 1 {
            debug!(skipped = advanced - 1, "tick overran, skipping grid points");
        }

        while !stop.is_stopped() {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            thread::sleep(left.min(SLEEP_SLICE));
        }
        advanced
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    /// Grid points skipped because a tick overran.
    pub missed_ticks: u64,
    pub metrics_runs: u64,
    pub advisory_runs: u64,
}

pub fn run<T: Tasks, S: Sleeper>(
    schedule: Schedule,
    tasks: &mut T,
    sleeper: &mut S,
    stop: &StopFlag,
) -> Result<RunSummary> {
    let mut metrics = IntervalTimer::new(schedule.metrics_every, true);
    let mut advisory = IntervalTimer::new(schedule.advisory_every, false);
    let mut summary = RunSummary::default();
    let mut tick = 0u64;

    info!(
        base_secs = schedule.base.as_secs(),
        metrics_every = schedule.metrics_every,
        advisory_every = schedule.advisory_every,
        "scheduler started"
    );

    sleeper.begin();
    while !stop.is_stopped() {
        let fire_metrics = metrics.fires_at(tick);
        let fire_advisory = advisory.fires_at(tick);
        debug!(tick, fire_metrics, fire_advisory, "tick");

        tasks.begin_tick();
        if fire_metrics {
            tasks.metrics()?;
            summary.metrics_runs += 1;
        }
        if fire_advisory {
            tasks.advisory()?;
            summary.advisory_runs += 1;
        }
        summary.ticks += 1;

        if stop.is_stopped() {
            break;
        }
        let advanced = sleeper.sleep(schedule.base, stop).max(1);
        summary.missed_ticks += advanced - 1;
        tick += advanced;
    }

    info!(
        ticks = summary.ticks,
        missed_ticks = summary.missed_ticks,
        metrics_runs = summary.metrics_runs,
        advisory_runs = summary.advisory_runs,
        "scheduler stopped"
    );
    Ok(summary)
}
