//! Simulation observer trait for progress reporting and data collection.

use drt_core::SimTime;
use drt_dispatch::DispatchReport;
use drt_mobility::TaskEvent;

use crate::SimStats;

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// step loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: dispatch logger
///
/// ```rust,ignore
/// struct DispatchPrinter;
///
/// impl SimObserver for DispatchPrinter {
///     fn on_dispatch(&mut self, report: &DispatchReport) {
///         println!("{}: {} planned", report.now, report.planned.len());
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each step, before any processing.
    fn on_step_start(&mut self, _now: SimTime) {}

    /// Task boundaries reached this step, after request side effects were
    /// applied.  Not called when nothing happened.
    fn on_events(&mut self, _now: SimTime, _events: &[TaskEvent]) {}

    /// Called after every dispatch cycle, including charging planning.
    fn on_dispatch(&mut self, _report: &DispatchReport) {}

    /// Called at the end of each step.
    fn on_step_end(&mut self, _now: SimTime) {}

    /// Called once after the final step completes.
    fn on_sim_end(&mut self, _now: SimTime, _stats: &SimStats) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
