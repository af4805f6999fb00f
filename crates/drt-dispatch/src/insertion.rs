//! Evaluating and committing one request into one vehicle's schedule.
//!
//! New work is always appended: it is carved from the head of the
//! vehicle's trailing Stay, starting at the vehicle's available
//! position-time.  Committed tasks are never moved; a cancelled request is
//! taken back out with [`retract`].
//!
//! ```text
//! before:  … [Dropoff r1] [Stay ─────────────────────────────────────]
//! after:   … [Dropoff r1] [Drive] [Stay wait] [Pickup] [Drive] [Dropoff] [Stay ──]
//! ```

use drt_core::{NodeId, RequestId, SimTime, VehicleId};
use drt_demand::Request;
use drt_fleet::Vehicle;
use drt_schedule::{ScheduleError, Task, TaskKind, TaskStatus};
use drt_spatial::{RoadNetwork, Route, Router};

use crate::cost::CostInputs;
use crate::energy::{project_soc, task_energy};
use crate::{DispatchConfig, DispatchError, DispatchResult, RejectionReason};

/// Shared, read-only inputs of one evaluation.
pub struct InsertionContext<'a, R: Router> {
    pub network: &'a RoadNetwork,
    pub router: &'a R,
    pub config: &'a DispatchConfig,
    pub now: SimTime,
}

/// A feasible way to serve a request with one vehicle.
#[derive(Clone, Debug, PartialEq)]
pub struct Insertion {
    pub vehicle: VehicleId,
    /// Where the new tasks start in the schedule.
    pub depart: SimTime,
    /// `Drive, [Stay], Pickup, Drive, Dropoff`; zero-length drives omitted.
    pub tasks: Vec<Task>,
    pub pickup_at: SimTime,
    pub dropoff_at: SimTime,
    pub cost: f64,
}

/// Where the vehicle is and when new work may begin, plus the end of the
/// idle time available for it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Slot {
    pub node: NodeId,
    pub depart: SimTime,
    pub until: SimTime,
}

/// The part of the trailing Stay that is open for new work.
///
/// A Stay that has already started can only be cut strictly after its
/// begin, so work starts one second later when the vehicle has just gone
/// idle.
pub(crate) fn open_slot(vehicle: &Vehicle, now: SimTime) -> Option<Slot> {
    let (_, stay) = vehicle.schedule().trailing_stay()?;
    let (node, mut depart) = vehicle.available_position_time(now);
    match stay.status() {
        TaskStatus::Planned => {}
        TaskStatus::Started if depart == stay.begin => depart = depart.offset(1),
        TaskStatus::Started => {}
        TaskStatus::Performed => return None,
    }
    (depart < stay.end).then_some(Slot { node, depart, until: stay.end })
}

/// Route one leg.  A non-trivial route always takes at least a second so
/// the resulting Drive task is never empty.
pub(crate) fn route_leg<R: Router>(
    network: &RoadNetwork,
    router: &R,
    from: NodeId,
    to: NodeId,
    departure: SimTime,
) -> Option<Route> {
    match router.route(network, from, to, departure) {
        Ok(mut route) => {
            if !route.is_trivial() && route.arrival <= route.departure {
                route.arrival = route.departure.offset(1);
            }
            Some(route)
        }
        Err(e) => {
            tracing::debug!(%from, %to, error = %e, "leg not routable");
            None
        }
    }
}

/// Check whether `vehicle` can serve `request`, and at what cost.
pub fn evaluate<R: Router>(
    ctx: &InsertionContext<'_, R>,
    vehicle: &Vehicle,
    request: &Request,
) -> Result<Insertion, RejectionReason> {
    if vehicle.capacity == 0 {
        return Err(RejectionReason::NoSeats);
    }
    let slot = open_slot(vehicle, ctx.now).ok_or(RejectionReason::Unavailable)?;

    let to_origin = route_leg(ctx.network, ctx.router, slot.node, request.origin, slot.depart)
        .ok_or(RejectionReason::NoPath)?;
    let mut drive_secs = to_origin.travel_secs();
    let mut drive_m = to_origin.length_m;
    let mut t = to_origin.arrival;

    let mut tasks = Vec::with_capacity(5);
    if !to_origin.is_trivial() {
        tasks.push(Task::drive(to_origin));
    }
    if let Some(window) = request.window {
        if t > window.latest {
            return Err(RejectionReason::OutsideWindow { arrival: t, latest: window.latest });
        }
        if t < window.earliest {
            tasks.push(Task::stay(request.origin, t, window.earliest));
            t = window.earliest;
        }
    }

    let pickup_at = t;
    let pickup_end = pickup_at.offset(ctx.config.pickup_secs);
    tasks.push(Task::pickup(request.id, request.origin, pickup_at, pickup_end));

    let to_destination = route_leg(ctx.network, ctx.router, request.origin, request.destination, pickup_end)
        .ok_or(RejectionReason::NoPath)?;
    drive_secs += to_destination.travel_secs();
    drive_m += to_destination.length_m;
    let dropoff_at = to_destination.arrival;
    if !to_destination.is_trivial() {
        tasks.push(Task::drive(to_destination));
    }
    let dropoff_end = dropoff_at.offset(ctx.config.dropoff_secs);
    tasks.push(Task::dropoff(request.id, request.destination, dropoff_at, dropoff_end));

    if dropoff_end > slot.until {
        return Err(RejectionReason::BeyondHorizon { dropoff_end, horizon_end: slot.until });
    }

    if let Some(profile) = vehicle.profile() {
        tasks = tasks
            .into_iter()
            .map(|task| {
                let kwh = task_energy(profile, &task);
                task.with_energy(kwh)
            })
            .collect();
        if let Some(projection) = project_soc(vehicle, slot.depart, &tasks) {
            if !projection.is_feasible() {
                return Err(RejectionReason::EnergyInfeasible { min_soc_kwh: projection.min });
            }
        }
    }

    let cost = ctx.config.cost.evaluate(&CostInputs { now: ctx.now, pickup_at, drive_secs, drive_m });
    Ok(Insertion { vehicle: vehicle.id, depart: slot.depart, tasks, pickup_at, dropoff_at, cost })
}

/// Write `insertion` into the vehicle's schedule.
///
/// The candidate must have been evaluated against this vehicle's current
/// schedule; any structural mismatch is an
/// [`InvalidInsertion`](DispatchError::InvalidInsertion).
pub fn commit(insertion: Insertion, vehicle: &mut Vehicle) -> DispatchResult<()> {
    insert_tasks(vehicle, insertion.depart, insertion.tasks)
}

/// Carve `tasks`, back to back, from the Stay open at `depart`.
pub(crate) fn insert_tasks(vehicle: &mut Vehicle, depart: SimTime, tasks: Vec<Task>) -> DispatchResult<()> {
    let id = vehicle.id;
    let wrap = |source: ScheduleError| DispatchError::InvalidInsertion { vehicle: id, source };

    let schedule = vehicle.schedule_mut();
    let mut at = schedule.insertion_point(depart).map_err(wrap)?;
    for task in tasks {
        schedule.insert(task, at).map_err(wrap)?;
        at += 1;
    }
    Ok(())
}

/// Take a planned request back out of the vehicle's schedule.
///
/// Its pickup must not have started.  When only idle time follows the
/// dropoff, everything from the end of the previous commitment on becomes
/// one Stay again.  Otherwise later work starts where this trip ends, so
/// the drives are kept and only the pickup and dropoff are vacated.
pub fn retract(vehicle: &mut Vehicle, request: RequestId) -> DispatchResult<()> {
    let id = vehicle.id;
    let refuse = |reason: String| DispatchError::CannotRetract { request, vehicle: id, reason };

    let tasks = vehicle.schedule().tasks();
    let (Some(pickup), Some(dropoff)) = (
        tasks.iter().position(|t| t.kind == TaskKind::Pickup { request }),
        tasks.iter().position(|t| t.kind == TaskKind::Dropoff { request }),
    ) else {
        return Err(refuse("not in the schedule".into()));
    };
    if tasks[pickup].status() != TaskStatus::Planned {
        return Err(refuse(format!("pickup is already {:?}", tasks[pickup].status())));
    }

    let trailing = tasks[dropoff + 1..].iter().all(Task::is_stay);
    let schedule_err = |source: ScheduleError| refuse(source.to_string());
    if trailing {
        let mut first = pickup;
        while first > 0 {
            let prev = &tasks[first - 1];
            let approach = prev.is_stay() || matches!(prev.kind, TaskKind::Drive { .. });
            if !approach || prev.status() != TaskStatus::Planned {
                break;
            }
            first -= 1;
        }
        let idle_secs = vehicle.schedule().end().saturating_since(tasks[first].begin);
        let energy = vehicle.profile().map(|p| p.idle_energy(idle_secs));
        vehicle.schedule_mut().retract_from(first, energy).map_err(schedule_err)?;
    } else {
        let schedule = vehicle.schedule_mut();
        schedule.vacate(pickup).map_err(schedule_err)?;
        schedule.vacate(dropoff).map_err(schedule_err)?;
    }
    tracing::debug!(%request, vehicle = %id, trailing, "request retracted from schedule");
    Ok(())
}
