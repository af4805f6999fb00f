//! The `Sim` struct and its step loop.

use std::collections::VecDeque;

use drt_core::{ChargerId, NodeId, RequestId, SimClock, SimConfig, SimTime, VehicleId};
use drt_demand::{CancelReason, DemandError, Request, RequestEntry, RequestRegistry, RequestStatus};
use drt_dispatch::{AllVehicles, CandidatePolicy, ChargingPlanner, DispatchReport, Dispatcher, retract};
use drt_ev::ChargingInfrastructure;
use drt_fleet::Fleet;
use drt_mobility::{Activity, ScheduleExecutor, TaskEvent, TaskPhase};
use drt_schedule::Schedule;
use drt_spatial::{RoadNetwork, Router};

use crate::{SimObserver, SimResult, SimStats};

/// The simulation runner.
///
/// `Sim<R, C>` owns the fleet, the request registry and the charger pool,
/// and drives the four-phase step loop:
///
/// 1. **Release**: scripted requests whose `submitted` time has come are
///    handed to the registry.
/// 2. **Execute** (optionally parallel with the `parallel` feature): every
///    vehicle's schedule is advanced to `now`, producing task-boundary
///    events.  Charge tasks plug into their charger here.
/// 3. **Apply** (sequential, ascending `VehicleId`): pickups and dropoffs
///    update their requests.
/// 4. **Dispatch** (every `dispatch_interval_steps`): pending requests are
///    inserted into schedules, then idle electric vehicles with a low
///    battery are sent to charge.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<R: Router, C: CandidatePolicy = AllVehicles> {
    pub config: SimConfig,
    pub clock: SimClock,

    pub(crate) network: RoadNetwork,
    pub(crate) router: R,
    pub(crate) fleet: Fleet,
    pub(crate) requests: RequestRegistry,
    /// Scripted requests not yet released, sorted by `submitted`.
    pub(crate) arrivals: VecDeque<Request>,
    pub(crate) chargers: ChargingInfrastructure,
    pub(crate) executor: ScheduleExecutor,
    pub(crate) dispatcher: Dispatcher<C>,
    pub(crate) charging: ChargingPlanner,
    pub(crate) stats: SimStats,
}

impl<R: Router, C: CandidatePolicy> Sim<R, C> {
    // ── Running ───────────────────────────────────────────────────────────

    /// Run from the current step until `config.end_time`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        while self.clock.now() < self.config.end_time {
            self.process_step(observer)?;
        }
        observer.on_sim_end(self.clock.now(), &self.stats);
        tracing::info!(
            now = %self.clock.now(),
            submitted = self.stats.submitted,
            planned = self.stats.planned,
            performed = self.stats.performed,
            cancelled = self.stats.cancelled,
            "simulation finished"
        );
        Ok(())
    }

    /// Run exactly `n` steps from the current position (ignores `end_time`).
    pub fn run_steps<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.process_step(observer)?;
        }
        Ok(())
    }

    /// Run one dispatch cycle at the current time: request insertion, then
    /// charging planning.  The step loop calls this on dispatch steps; it
    /// can also be triggered by hand between steps.
    pub fn run_dispatch_cycle(&mut self) -> SimResult<DispatchReport> {
        let now = self.clock.now();
        let mut report =
            self.dispatcher
                .run_cycle(now, &mut self.fleet, &mut self.requests, &self.network, &self.router)?;
        report.charging =
            self.charging
                .plan(now, &mut self.fleet, &self.chargers, &self.network, &self.router)?;
        self.stats.record_dispatch(&report);
        Ok(report)
    }

    // ── Demand ────────────────────────────────────────────────────────────

    /// Submit a request.  It enters the registry right away if its
    /// `submitted` time has passed, otherwise when the clock reaches it.
    pub fn submit(&mut self, request: Request) -> SimResult<()> {
        self.network.check_node(request.origin)?;
        self.network.check_node(request.destination)?;
        if request.submitted <= self.clock.now() {
            return self.release(request);
        }
        let at = self.arrivals.partition_point(|r| r.submitted <= request.submitted);
        self.arrivals.insert(at, request);
        Ok(())
    }

    /// Withdraw a request whose passenger has not been picked up.
    ///
    /// A planned request is taken out of its vehicle's schedule first; once
    /// its pickup has started the withdrawal fails and nothing changes.
    pub fn withdraw(&mut self, id: RequestId, why: impl Into<String>) -> SimResult<()> {
        let entry = self.requests.get(id)?;
        match (&entry.status, entry.vehicle) {
            (RequestStatus::Unplanned, _) => {}
            (RequestStatus::Planned, Some(vehicle)) => retract(self.fleet.get_mut(vehicle)?, id)?,
            (status, _) => {
                return Err(DemandError::InvalidTransition { id, from: status.clone(), to: "withdrawn" }.into());
            }
        }
        self.requests.mark_cancelled(id, CancelReason::Withdrawn(why.into()), self.clock.now())?;
        self.stats.cancelled += 1;
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    /// Copy of a vehicle's schedule as it stands now.
    pub fn schedule_snapshot(&self, vehicle: VehicleId) -> SimResult<Schedule> {
        Ok(self.fleet.get(vehicle)?.schedule().clone())
    }

    pub fn request_status(&self, id: RequestId) -> SimResult<RequestStatus> {
        Ok(self.requests.status(id)?.clone())
    }

    pub fn request_entry(&self, id: RequestId) -> SimResult<&RequestEntry> {
        Ok(self.requests.get(id)?)
    }

    /// Vehicles currently plugged into `charger`.
    pub fn charger_occupancy(&self, charger: ChargerId) -> SimResult<Vec<VehicleId>> {
        Ok(self.chargers.occupancy(charger)?)
    }

    /// `(from, to, progress)` of a vehicle at the current time.
    pub fn vehicle_position(&self, vehicle: VehicleId) -> Option<(NodeId, NodeId, f32)> {
        self.executor.position(vehicle, self.clock.now())
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn requests(&self) -> &RequestRegistry {
        &self.requests
    }

    pub fn chargers(&self) -> &ChargingInfrastructure {
        &self.chargers
    }

    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Scripted requests still waiting for their submission time.
    pub fn queued_requests(&self) -> usize {
        self.arrivals.len()
    }

    // ── Core step processing ──────────────────────────────────────────────

    fn process_step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let now = self.clock.now();
        observer.on_step_start(now);

        // ── Phase 1: release due requests ─────────────────────────────────
        while self.arrivals.front().is_some_and(|r| r.submitted <= now) {
            if let Some(request) = self.arrivals.pop_front() {
                self.release(request)?;
            }
        }

        // ── Phase 2: execute schedules (fan-out inside the executor) ──────
        let events = self.executor.step(&mut self.fleet, &self.chargers, now)?;

        // ── Phase 3: cross-vehicle side effects, in event order ───────────
        self.apply_events(&events)?;
        if !events.is_empty() {
            observer.on_events(now, &events);
        }

        // ── Phase 4: dispatch ─────────────────────────────────────────────
        if self.config.is_dispatch_step(self.clock.step) {
            let report = self.run_dispatch_cycle()?;
            observer.on_dispatch(&report);
        }

        observer.on_step_end(now);
        self.clock.advance();
        self.stats.steps += 1;
        Ok(())
    }

    fn release(&mut self, request: Request) -> SimResult<()> {
        self.requests.submit(request)?;
        self.stats.submitted += 1;
        Ok(())
    }

    fn apply_events(&mut self, events: &[TaskEvent]) -> SimResult<()> {
        for event in events {
            match (event.phase, event.activity) {
                (TaskPhase::Ended, Activity::Pickup(request)) => {
                    self.requests.mark_picked_up(request, event.at)?;
                    tracing::debug!(%request, vehicle = %event.vehicle, at = %event.at, "passenger picked up");
                }
                (TaskPhase::Ended, Activity::Dropoff(request)) => {
                    self.requests.mark_performed(request, event.at)?;
                    tracing::debug!(%request, vehicle = %event.vehicle, at = %event.at, "passenger dropped off");
                }
                _ => {}
            }
            self.stats.record_event(event);
        }
        Ok(())
    }
}
