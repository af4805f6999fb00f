//! Run-level counters.

use drt_dispatch::DispatchReport;
use drt_mobility::{Activity, TaskEvent, TaskPhase};

/// Totals accumulated over a run, updated after every step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimStats {
    pub steps: u64,
    pub dispatch_cycles: u64,
    pub submitted: usize,
    pub planned: usize,
    pub cancelled: usize,
    pub picked_up: usize,
    pub performed: usize,
    pub charging_planned: usize,
    pub charging_completed: usize,
    pub charging_forfeited: usize,
    /// Energy drawn from batteries, positive kWh.
    pub energy_used_kwh: f64,
    pub energy_charged_kwh: f64,
}

impl SimStats {
    pub(crate) fn record_dispatch(&mut self, report: &DispatchReport) {
        self.dispatch_cycles += 1;
        self.planned += report.planned.len();
        self.cancelled += report.cancelled.len();
        self.charging_planned += report.charging.len();
    }

    pub(crate) fn record_event(&mut self, event: &TaskEvent) {
        match (event.phase, event.activity) {
            (TaskPhase::Ended, Activity::Pickup(_)) => self.picked_up += 1,
            (TaskPhase::Ended, Activity::Dropoff(_)) => self.performed += 1,
            (TaskPhase::Started, Activity::Charge { plugged: false, .. }) => self.charging_forfeited += 1,
            (TaskPhase::Ended, Activity::Charge { plugged: true, .. }) => self.charging_completed += 1,
            _ => {}
        }
        match event.energy_kwh {
            Some(kwh) if kwh > 0.0 => self.energy_charged_kwh += kwh,
            Some(kwh) => self.energy_used_kwh -= kwh,
            None => {}
        }
    }

    /// Share of released requests that ended up planned.
    pub fn service_rate(&self) -> f64 {
        if self.submitted == 0 {
            return 0.0;
        }
        self.planned as f64 / self.submitted as f64
    }
}
