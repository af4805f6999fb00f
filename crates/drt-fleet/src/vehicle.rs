//! A single fleet vehicle.

use drt_core::{NodeId, SimTime, VehicleId};
use drt_ev::{Battery, EnergyProfile};
use drt_schedule::{Schedule, ScheduleError, Task, TaskStatus};

use crate::{FleetError, FleetResult};

/// Battery state plus the model it belongs to.
#[derive(Clone, Debug)]
struct Energy {
    profile: EnergyProfile,
    battery: Battery,
}

/// A vehicle with its operating horizon `[start, end)`, seats and schedule.
///
/// Electric vehicles also own a battery, and every task in their schedule is
/// energy-aware.  Only the vehicle's own task execution changes the battery.
#[derive(Clone, Debug)]
pub struct Vehicle {
    pub id: VehicleId,
    pub start_node: NodeId,
    pub start: SimTime,
    pub end: SimTime,
    /// Passenger seats.
    pub capacity: u32,
    energy: Option<Energy>,
    schedule: Schedule,
}

impl Vehicle {
    /// A conventional vehicle idle at `start_node` for its whole horizon.
    pub fn new(
        id: VehicleId,
        start_node: NodeId,
        start: SimTime,
        end: SimTime,
        capacity: u32,
    ) -> FleetResult<Self> {
        let schedule = Schedule::new(start_node, start, end).map_err(|source| schedule_err(id, source))?;
        Ok(Self { id, start_node, start, end, capacity, energy: None, schedule })
    }

    /// An electric vehicle starting with `initial_soc_kwh` in the battery.
    pub fn electric(
        id: VehicleId,
        start_node: NodeId,
        start: SimTime,
        end: SimTime,
        capacity: u32,
        profile: EnergyProfile,
        initial_soc_kwh: f64,
    ) -> FleetResult<Self> {
        let battery = Battery::new(profile.capacity_kwh, initial_soc_kwh)?;
        let idle = profile.idle_energy(end.saturating_since(start));
        let schedule = Schedule::with_idle_energy(start_node, start, end, idle)
            .map_err(|source| schedule_err(id, source))?;
        Ok(Self {
            id,
            start_node,
            start,
            end,
            capacity,
            energy: Some(Energy { profile, battery }),
            schedule,
        })
    }

    #[inline]
    pub fn is_electric(&self) -> bool {
        self.energy.is_some()
    }

    pub fn profile(&self) -> Option<&EnergyProfile> {
        self.energy.as_ref().map(|e| &e.profile)
    }

    pub fn battery(&self) -> Option<&Battery> {
        self.energy.as_ref().map(|e| &e.battery)
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Exclusive schedule access for commits.
    pub fn schedule_mut(&mut self) -> &mut Schedule {
        &mut self.schedule
    }

    /// Where and when the vehicle can next start new work.
    ///
    /// If the schedule ends in an idle Stay, that is the Stay's location at
    /// the later of the Stay's begin and `now`.  Otherwise the vehicle is
    /// booked to its horizon end, and the answer is where its last task
    /// ends.
    pub fn available_position_time(&self, now: SimTime) -> (NodeId, SimTime) {
        match self.schedule.trailing_stay() {
            Some((_, stay)) => (stay.to, stay.begin.max(now)),
            None => self
                .schedule
                .tasks()
                .last()
                .map_or((self.start_node, self.end), |t| (t.to, t.end)),
        }
    }

    /// Advance task `idx` to `status` at time `at`.
    ///
    /// When an energy-aware task is performed its delta is applied to the
    /// battery; the change actually applied (after clamping) is returned.
    pub fn advance_task(&mut self, idx: usize, status: TaskStatus, at: SimTime) -> FleetResult<Option<f64>> {
        let id = self.id;
        let task = self.schedule.advance(idx, status, at).map_err(|source| schedule_err(id, source))?;
        if status != TaskStatus::Performed {
            return Ok(None);
        }
        let Some(delta) = task.energy_kwh() else {
            return Ok(None);
        };
        let applied = match self.energy.as_mut() {
            Some(e) => e.battery.apply(delta),
            None => return Ok(None),
        };
        tracing::trace!(vehicle = %id, task = idx, delta, applied, "energy applied");
        Ok(Some(applied))
    }

    /// Cancel the energy of a not-yet-performed task (e.g. a charge session
    /// that found no free plug).
    pub fn forfeit_energy(&mut self, idx: usize) -> FleetResult<()> {
        let id = self.id;
        self.schedule.override_energy(idx, 0.0).map_err(|source| schedule_err(id, source))
    }

    /// The task at `idx`, for callers holding an index from this schedule.
    pub fn task(&self, idx: usize) -> FleetResult<&Task> {
        self.schedule.get(idx).map_err(|source| schedule_err(self.id, source))
    }
}

fn schedule_err(id: VehicleId, source: ScheduleError) -> FleetError {
    FleetError::Schedule { id, source }
}
