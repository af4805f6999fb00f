//! Executing committed schedules against the simulation clock.

use drt_core::{ChargerId, NodeId, SimTime, VehicleId};
use drt_ev::{ChargingInfrastructure, EvError};
use drt_fleet::{Fleet, Vehicle};
use drt_schedule::{TaskKind, TaskStatus};

use crate::{Activity, MobilityError, MobilityResult, MovementState, TaskEvent, TaskPhase};

/// Movement state of every vehicle, indexed by `VehicleId`.
#[derive(Debug, Clone, Default)]
pub struct MobilityStore {
    pub states: Vec<MovementState>,
}

impl MobilityStore {
    /// Every vehicle stationary at its start node and start time.
    pub fn for_fleet(fleet: &Fleet) -> Self {
        let states = fleet.iter().map(|v| MovementState::stationary(v.start_node, v.start)).collect();
        Self { states }
    }

    pub fn get(&self, vehicle: VehicleId) -> Option<&MovementState> {
        self.states.get(vehicle.index())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Stand-in for the network mobility simulation: vehicles carry out their
/// schedules exactly as planned, and task boundaries are reported as
/// [`TaskEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct ScheduleExecutor {
    pub store: MobilityStore,
}

impl ScheduleExecutor {
    pub fn new(fleet: &Fleet) -> Self {
        Self { store: MobilityStore::for_fleet(fleet) }
    }

    /// Advance every vehicle to `now` and return the resulting events in
    /// ascending vehicle id, each vehicle's events in schedule order.
    ///
    /// With the `parallel` feature vehicles are processed on Rayon; each
    /// vehicle and its movement state are touched by one worker only.
    pub fn step(
        &mut self,
        fleet: &mut Fleet,
        chargers: &ChargingInfrastructure,
        now: SimTime,
    ) -> MobilityResult<Vec<TaskEvent>> {
        let vehicles = fleet.as_mut_slice();
        if vehicles.len() != self.store.states.len() {
            return Err(MobilityError::StoreMismatch { states: self.store.states.len(), vehicles: vehicles.len() });
        }

        #[cfg(not(feature = "parallel"))]
        let per_vehicle: Vec<MobilityResult<Vec<TaskEvent>>> = vehicles
            .iter_mut()
            .zip(self.store.states.iter_mut())
            .map(|(vehicle, state)| execute_vehicle(vehicle, state, chargers, now))
            .collect();

        #[cfg(feature = "parallel")]
        let per_vehicle: Vec<MobilityResult<Vec<TaskEvent>>> = {
            use rayon::prelude::*;
            vehicles
                .par_iter_mut()
                .zip(self.store.states.par_iter_mut())
                .map(|(vehicle, state)| execute_vehicle(vehicle, state, chargers, now))
                .collect()
        };

        let mut events = Vec::new();
        for result in per_vehicle {
            events.extend(result?);
        }
        Ok(events)
    }

    /// `(from, to, progress)` for rendering; see [`MovementState::progress`].
    pub fn position(&self, vehicle: VehicleId, now: SimTime) -> Option<(NodeId, NodeId, f32)> {
        self.store
            .get(vehicle)
            .map(|s| (s.departure_node, s.destination_node, s.progress(now)))
    }
}

/// Bring one vehicle's schedule up to `now`: end every started task whose
/// end has passed and start every planned task whose begin has passed, in
/// schedule order.
///
/// Charge tasks plug into their charger when they start.  If every plug is
/// taken the session is forfeited: the task keeps its slot but its energy
/// becomes zero.
pub fn execute_vehicle(
    vehicle: &mut Vehicle,
    state: &mut MovementState,
    chargers: &ChargingInfrastructure,
    now: SimTime,
) -> MobilityResult<Vec<TaskEvent>> {
    let mut events = Vec::new();
    loop {
        let Some((index, task)) = vehicle.schedule().unperformed().next() else {
            break;
        };
        let status = task.status();
        let (begin, end, from, to) = (task.begin, task.end, task.from, task.to);
        let mut activity = Activity::of(&task.kind);
        let driving = match &task.kind {
            TaskKind::Drive { route } => Some(MovementState::driving(route)),
            _ => None,
        };

        match status {
            TaskStatus::Planned if begin <= now => {
                vehicle.advance_task(index, TaskStatus::Started, begin)?;
                if let Activity::Charge { charger, .. } = activity {
                    activity = plug_in(vehicle, index, charger, chargers)?;
                }
                *state = driving.unwrap_or_else(|| MovementState::stationary(from, begin));
                events.push(TaskEvent {
                    vehicle: vehicle.id,
                    index,
                    phase: TaskPhase::Started,
                    activity,
                    at: begin,
                    energy_kwh: None,
                });
            }
            TaskStatus::Started if end <= now => {
                let energy_kwh = vehicle.advance_task(index, TaskStatus::Performed, end)?;
                if let Activity::Charge { charger, .. } = activity {
                    let plugged = chargers.release(charger, vehicle.id)?;
                    activity = Activity::Charge { charger, plugged };
                }
                if driving.is_some() {
                    *state = MovementState::stationary(to, end);
                }
                events.push(TaskEvent {
                    vehicle: vehicle.id,
                    index,
                    phase: TaskPhase::Ended,
                    activity,
                    at: end,
                    energy_kwh,
                });
            }
            _ => break,
        }
    }
    Ok(events)
}

fn plug_in(
    vehicle: &mut Vehicle,
    index: usize,
    charger: ChargerId,
    chargers: &ChargingInfrastructure,
) -> MobilityResult<Activity> {
    match chargers.occupy(charger, vehicle.id) {
        Ok(()) => {
            tracing::debug!(vehicle = %vehicle.id, %charger, "plugged in");
            Ok(Activity::Charge { charger, plugged: true })
        }
        Err(EvError::ChargerAtCapacity { plugs, .. }) => {
            tracing::warn!(vehicle = %vehicle.id, %charger, plugs, "charger full, charging session forfeited");
            vehicle.forfeit_energy(index)?;
            Ok(Activity::Charge { charger, plugged: false })
        }
        Err(e) => Err(e.into()),
    }
}
