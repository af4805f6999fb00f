//! Simulation time model.
//!
//! # Design
//!
//! Time is an integer number of seconds since the scenario epoch, wrapped in
//! `SimTime`.  Schedules compare task boundaries for exact equality
//! (contiguity), so the canonical unit must be integral.  Quantities that come
//! out of continuous models (travel times in milliseconds, charging durations)
//! are rounded *up* to whole seconds at the boundary where they become task
//! times, so a vehicle is never scheduled to finish before it physically can.
//!
//! The step loop advances a `SimClock` by `step_secs` per step; dispatch runs
//! every `dispatch_interval_steps` steps.

use std::fmt;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// Absolute simulation time in whole seconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);
    pub const MAX: SimTime = SimTime(u64::MAX);

    /// The instant `secs` seconds after `self`.
    #[inline]
    pub fn offset(self, secs: u64) -> SimTime {
        SimTime(self.0.saturating_add(secs))
    }

    /// Seconds from `earlier` to `self`, zero if `earlier` is later.
    #[inline]
    pub fn saturating_since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Round a fractional number of seconds up to whole seconds.
    #[inline]
    pub fn ceil_secs(secs: f64) -> u64 {
        if secs <= 0.0 { 0 } else { secs.ceil() as u64 }
    }

    #[inline]
    pub fn as_hours(self) -> f64 {
        self.0 as f64 / 3_600.0
    }
}

impl std::ops::Add<u64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: u64) -> SimTime {
        self.offset(rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = u64;
    /// Seconds between two instants.
    ///
    /// # Panics
    /// Panics in debug mode if `rhs > self`.
    #[inline]
    fn sub(self, rhs: SimTime) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    /// `d1 07:30:00` style; the day prefix is omitted on day 0.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.0 / 86_400;
        let h = (self.0 % 86_400) / 3_600;
        let m = (self.0 % 3_600) / 60;
        let s = self.0 % 60;
        if days > 0 {
            write!(f, "d{days} {h:02}:{m:02}:{s:02}")
        } else {
            write!(f, "{h:02}:{m:02}:{s:02}")
        }
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Tracks the current step and its simulation time.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Time of step 0.
    pub start: SimTime,
    /// Seconds advanced per step.
    pub step_secs: u32,
    /// Number of completed steps.
    pub step: u64,
}

impl SimClock {
    pub fn new(start: SimTime, step_secs: u32) -> Self {
        debug_assert!(step_secs > 0, "step_secs must be > 0");
        Self { start, step_secs, step: 0 }
    }

    /// Simulation time at the current step.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.start.offset(self.step * self.step_secs as u64)
    }

    #[inline]
    pub fn advance(&mut self) {
        self.step += 1;
    }

    /// Steps needed to cover `secs` seconds (rounds up).
    #[inline]
    pub fn steps_for_secs(&self, secs: u64) -> u64 {
        secs.div_ceil(self.step_secs as u64)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.step, self.now())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level run configuration.
///
/// Loaded from JSON by the application (with the `serde` feature) or built
/// in code; `Default` gives a one-day run at 1 s steps with dispatch every
/// 60 steps.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// First simulated instant.
    pub start_time: SimTime,

    /// End of the run (exclusive).
    pub end_time: SimTime,

    /// Seconds per step of the step loop.
    pub step_secs: u32,

    /// Run a dispatch cycle every N steps.  1 = every step.
    pub dispatch_interval_steps: u64,

    /// Master seed for demand generation.  Same seed, same run.
    pub seed: u64,

    /// Worker threads for the parallel event stage.  `None` = all cores.
    pub num_threads: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_time:              SimTime::ZERO,
            end_time:                SimTime(86_400),
            step_secs:               1,
            dispatch_interval_steps: 60,
            seed:                    42,
            num_threads:             None,
        }
    }
}

impl SimConfig {
    /// Steps between `start_time` and `end_time` (rounded up).
    pub fn total_steps(&self) -> u64 {
        self.end_time
            .saturating_since(self.start_time)
            .div_ceil(self.step_secs.max(1) as u64)
    }

    /// `true` if a dispatch cycle is due at `step`.
    #[inline]
    pub fn is_dispatch_step(&self, step: u64) -> bool {
        self.dispatch_interval_steps > 0 && step % self.dispatch_interval_steps == 0
    }

    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_time, self.step_secs)
    }
}
