//! State-of-charge projection for electric vehicles.

use drt_core::SimTime;
use drt_ev::EnergyProfile;
use drt_fleet::Vehicle;
use drt_schedule::{Task, TaskKind};

/// Below this a projected state of charge counts as negative.
const SOC_EPS_KWH: f64 = 1e-9;

/// Energy delta of a freshly built task.  Charge tasks are priced by the
/// charging planner, which knows the charger's power.
pub(crate) fn task_energy(profile: &EnergyProfile, task: &Task) -> f64 {
    match &task.kind {
        TaskKind::Drive { route } => profile.drive_energy(route.length_m),
        _ => profile.idle_energy(task.duration_secs()),
    }
}

/// Battery trajectory of a proposed insertion.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct SocProjection {
    /// State of charge once the proposed tasks are done.
    pub after_tasks: f64,
    /// Lowest state of charge anywhere along the schedule.
    pub min: f64,
}

impl SocProjection {
    pub fn is_feasible(&self) -> bool {
        self.min >= -SOC_EPS_KWH
    }
}

/// Simulate the battery through everything the vehicle still has to do:
/// its unperformed tasks, the part of the trailing Stay before `depart`,
/// the proposed `tasks`, and the rest of the trailing Stay after them.
///
/// Charging is capped at the battery capacity, as the battery itself does;
/// consumption is not floored, so an infeasible plan shows a negative
/// minimum.  Returns `None` for conventional vehicles or schedules without a
/// trailing Stay.
pub(crate) fn project_soc(vehicle: &Vehicle, depart: SimTime, tasks: &[Task]) -> Option<SocProjection> {
    let battery = vehicle.battery()?;
    let schedule = vehicle.schedule();
    let (stay_idx, stay) = schedule.trailing_stay()?;

    let capacity = battery.capacity_kwh();
    let mut soc = battery.soc_kwh();
    let mut min = soc;
    let mut step = |delta: f64| {
        soc = (soc + delta).min(capacity);
        min = min.min(soc);
        soc
    };

    for (idx, task) in schedule.unperformed() {
        if idx == stay_idx {
            break;
        }
        step(task.energy_kwh().unwrap_or(0.0));
    }

    let stay_share = |from: SimTime, to: SimTime| match stay.energy_kwh() {
        Some(e) if stay.duration_secs() > 0 => {
            e * to.saturating_since(from) as f64 / stay.duration_secs() as f64
        }
        _ => 0.0,
    };

    let mut after_tasks = step(stay_share(stay.begin, depart));
    for task in tasks {
        after_tasks = step(task.energy_kwh().unwrap_or(0.0));
    }
    let resume = tasks.last().map_or(depart, |t| t.end);
    step(stay_share(resume, stay.end));

    Some(SocProjection { after_tasks, min })
}
