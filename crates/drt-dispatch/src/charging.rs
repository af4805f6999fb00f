//! Charging planner: sends idle electric vehicles with a low battery to the
//! closest charger that will have a plug free for the whole session.
//!
//! Plugs are booked through the Charge tasks already in the fleet's
//! schedules, so a session planned in an earlier cycle is never handed
//! to a second vehicle.  Vehicles only plug in and out at step times, so
//! two sessions on one plug must not touch the same step.
//!
//! ```text
//! step:      0    1    2    3    4    5    6
//! booked:           [==========)                holds steps 2..=4
//! rejected:                    [=========)      holds 4..=6, shares step 4
//! accepted:                        [======)     holds 5..=6
//! ```

use rustc_hash::FxHashMap;

use drt_core::{ChargerId, SimTime};
use drt_ev::{Charger, ChargingInfrastructure};
use drt_fleet::{Fleet, Vehicle};
use drt_schedule::{Task, TaskKind};
use drt_spatial::{RoadNetwork, Route, Router};

use crate::energy::project_soc;
use crate::insertion::{insert_tasks, open_slot, route_leg};
use crate::{ChargingAssignment, ChargingPolicy, DispatchResult};

/// The times at which schedules are executed: `origin + k * step_secs`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StepGrid {
    pub origin: SimTime,
    pub step_secs: u64,
}

impl Default for StepGrid {
    fn default() -> Self {
        Self { origin: SimTime::ZERO, step_secs: 1 }
    }
}

impl StepGrid {
    /// The first step time at or after `t`.
    pub fn snap(&self, t: SimTime) -> SimTime {
        let step = self.step_secs.max(1);
        let since = t.saturating_since(self.origin);
        self.origin.offset(since.div_ceil(step) * step)
    }

    /// Steps at which a task over `[begin, end)` holds its plug, both ends
    /// included.
    fn held(&self, begin: SimTime, end: SimTime) -> (SimTime, SimTime) {
        (self.snap(begin), self.snap(end))
    }
}

/// Plug bookings per charger, as held step ranges.
#[derive(Debug)]
struct Bookings {
    grid: StepGrid,
    held: FxHashMap<ChargerId, Vec<(SimTime, SimTime)>>,
}

impl Bookings {
    /// Every Charge task in the fleet that has not been performed.
    fn of(fleet: &Fleet, grid: StepGrid) -> Self {
        let mut bookings = Self { grid, held: FxHashMap::default() };
        for vehicle in fleet.iter() {
            for (_, task) in vehicle.schedule().unperformed() {
                if let TaskKind::Charge { charger } = task.kind {
                    bookings.book(charger, task.begin, task.end);
                }
            }
        }
        bookings
    }

    fn book(&mut self, charger: ChargerId, begin: SimTime, end: SimTime) {
        let range = self.grid.held(begin, end);
        self.held.entry(charger).or_default().push(range);
    }

    /// `true` if fewer than `plugs` bookings touch `[begin, end)`.
    fn has_room(&self, charger: &Charger, begin: SimTime, end: SimTime) -> bool {
        let (from, to) = self.grid.held(begin, end);
        let overlapping = self
            .held
            .get(&charger.id)
            .map_or(0, |ranges| ranges.iter().filter(|&&(b, e)| b <= to && from <= e).count());
        overlapping < charger.plugs as usize
    }
}

#[derive(Clone, Debug, Default)]
pub struct ChargingPlanner {
    policy: ChargingPolicy,
    grid: StepGrid,
}

struct Session {
    charger: ChargerId,
    depart: SimTime,
    tasks: Vec<Task>,
    assignment: ChargingAssignment,
}

impl ChargingPlanner {
    pub fn new(policy: ChargingPolicy) -> DispatchResult<Self> {
        policy.validate()?;
        Ok(Self { policy, grid: StepGrid::default() })
    }

    /// Align plug bookings with the step loop that executes the plans.
    pub fn on_step_grid(mut self, origin: SimTime, step_secs: u64) -> Self {
        self.grid = StepGrid { origin, step_secs };
        self
    }

    pub fn policy(&self) -> &ChargingPolicy {
        &self.policy
    }

    /// Plan one `Drive + Charge` per idle electric vehicle whose projected
    /// state of charge is below `min_soc`.  Vehicles are visited in
    /// ascending id; each session is booked before the next vehicle looks.
    ///
    /// A vehicle is idle when its trailing Stay has begun.  Charging stops
    /// at `target_soc` or at the vehicle's horizon end, whichever is first.
    pub fn plan<R: Router>(
        &self,
        now: SimTime,
        fleet: &mut Fleet,
        infrastructure: &ChargingInfrastructure,
        network: &RoadNetwork,
        router: &R,
    ) -> DispatchResult<Vec<ChargingAssignment>> {
        let mut planned = Vec::new();
        if infrastructure.is_empty() {
            return Ok(planned);
        }
        let mut bookings = Bookings::of(fleet, self.grid);

        for id in fleet.vehicles_of(Vehicle::is_electric) {
            let vehicle = fleet.get(id)?;
            let Some(session) = self.session_for(vehicle, now, infrastructure, &bookings, network, router) else {
                continue;
            };
            let ChargingAssignment { begin, end, .. } = session.assignment;
            bookings.book(session.charger, begin, end);
            tracing::info!(
                vehicle = %id,
                charger = %session.charger,
                begin = %session.assignment.begin,
                end = %session.assignment.end,
                kwh = session.assignment.energy_kwh,
                "charging planned"
            );
            insert_tasks(fleet.get_mut(id)?, session.depart, session.tasks)?;
            planned.push(session.assignment);
        }
        Ok(planned)
    }

    fn session_for<R: Router>(
        &self,
        vehicle: &Vehicle,
        now: SimTime,
        infrastructure: &ChargingInfrastructure,
        bookings: &Bookings,
        network: &RoadNetwork,
        router: &R,
    ) -> Option<Session> {
        let profile = vehicle.profile()?;
        let (_, stay) = vehicle.schedule().trailing_stay()?;
        if stay.begin > now {
            return None;
        }
        let slot = open_slot(vehicle, now)?;
        let soc = project_soc(vehicle, slot.depart, &[])?.after_tasks;
        if soc / profile.capacity_kwh >= self.policy.min_soc {
            return None;
        }

        let session = infrastructure
            .iter()
            .filter_map(|c| route_leg(network, router, slot.node, c.node, slot.depart).map(|r| (c, r)))
            .filter(|(_, r)| soc + profile.drive_energy(r.length_m) >= 0.0)
            .filter_map(|(c, r)| {
                self.build_session(vehicle, soc, c, r, slot.depart, slot.until)
                    .filter(|s| bookings.has_room(c, s.assignment.begin, s.assignment.end))
            })
            .min_by_key(|s| (s.assignment.begin, s.charger));
        if session.is_none() {
            tracing::debug!(vehicle = %vehicle.id, soc_kwh = soc, "no reachable charger with a free plug");
        }
        session
    }

    fn build_session(
        &self,
        vehicle: &Vehicle,
        soc: f64,
        charger: &Charger,
        route: Route,
        depart: SimTime,
        until: SimTime,
    ) -> Option<Session> {
        let profile = vehicle.profile()?;
        let drive_kwh = profile.drive_energy(route.length_m);
        let soc_on_arrival = soc + drive_kwh;
        let begin = route.arrival;
        let wanted = profile.charge_secs_to(soc_on_arrival, charger.power_kw, self.policy.target_soc);
        let end = begin.offset(wanted).min(until);
        if end <= begin {
            return None;
        }
        let energy_kwh = profile.charge_energy(soc_on_arrival, charger.power_kw, end - begin);

        let mut tasks = Vec::with_capacity(2);
        if !route.is_trivial() {
            tasks.push(Task::drive(route).with_energy(drive_kwh));
        }
        tasks.push(Task::charge(charger.id, charger.node, begin, end).with_energy(energy_kwh));

        if !project_soc(vehicle, depart, &tasks)?.is_feasible() {
            return None;
        }
        Some(Session {
            charger: charger.id,
            depart,
            tasks,
            assignment: ChargingAssignment { vehicle: vehicle.id, charger: charger.id, begin, end, energy_kwh },
        })
    }
}
