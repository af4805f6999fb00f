//! Unit tests for drt-dispatch.

use std::sync::Arc;

use drt_core::{GeoPoint, NodeId, PassengerId, RequestId, SimTime, VehicleId};
use drt_demand::{Request, RequestRegistry};
use drt_ev::{ChargingCurve, EnergyProfile};
use drt_fleet::{Fleet, Vehicle};
use drt_spatial::{DijkstraRouter, RoadNetwork, RoadNetworkBuilder};

// ── Helpers ───────────────────────────────────────────────────────────────────

const A: NodeId = NodeId(0);
const B: NodeId = NodeId(1);
const C: NodeId = NodeId(2);
const D: NodeId = NodeId(3);
/// Not connected to anything.
const E: NodeId = NodeId(4);

/// A ─ B ─ C ─ D, 1 km and 60 s per hop, plus an isolated node E.
fn line() -> RoadNetwork {
    let mut b = RoadNetworkBuilder::new();
    for i in 0..5 {
        b.add_node(GeoPoint::new(0.0, i as f32 * 0.01));
    }
    b.add_road(A, B, 1_000.0, 60_000);
    b.add_road(B, C, 1_000.0, 60_000);
    b.add_road(C, D, 1_000.0, 60_000);
    b.build()
}

fn car(id: u32, node: NodeId) -> Vehicle {
    Vehicle::new(VehicleId(id), node, SimTime(0), SimTime(3_600), 4).unwrap()
}

fn profile() -> EnergyProfile {
    EnergyProfile::new(50.0, Arc::new(ChargingCurve::tesla())).with_consumption(0.2, 0.0)
}

fn ev(id: u32, node: NodeId, soc_kwh: f64) -> Vehicle {
    Vehicle::electric(VehicleId(id), node, SimTime(0), SimTime(3_600), 4, profile(), soc_kwh).unwrap()
}

fn trip(id: u32, origin: NodeId, destination: NodeId, submitted: u64) -> Request {
    Request::new(RequestId(id), PassengerId(id), origin, destination, SimTime(submitted))
}

fn registry(requests: Vec<Request>) -> RequestRegistry {
    let mut reg = RequestRegistry::new();
    for r in requests {
        reg.submit(r).unwrap();
    }
    reg
}

// ── Evaluation ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod evaluation {
    use drt_schedule::{TaskKind, TaskStatus};

    use super::*;
    use crate::{DispatchConfig, InsertionContext, RejectionReason, evaluate};

    fn eval(vehicle: &Vehicle, request: &Request, now: u64) -> Result<crate::Insertion, RejectionReason> {
        let network = line();
        let config = DispatchConfig::default();
        let ctx = InsertionContext { network: &network, router: &DijkstraRouter, config: &config, now: SimTime(now) };
        evaluate(&ctx, vehicle, request)
    }

    fn labels(ins: &crate::Insertion) -> Vec<&'static str> {
        ins.tasks.iter().map(|t| t.kind.label()).collect()
    }

    #[test]
    fn vehicle_at_origin_skips_empty_drive() {
        let ins = eval(&car(0, A), &trip(0, A, C, 0), 0).unwrap();
        assert_eq!(labels(&ins), ["pickup", "drive", "dropoff"]);
        assert_eq!(ins.pickup_at, SimTime(0));
        assert_eq!(ins.dropoff_at, SimTime(240));
        assert_eq!(ins.cost, 0.0);
    }

    #[test]
    fn empty_leg_then_trip() {
        let ins = eval(&car(0, B), &trip(0, A, C, 0), 0).unwrap();
        assert_eq!(labels(&ins), ["drive", "pickup", "drive", "dropoff"]);
        let spans: Vec<_> = ins.tasks.iter().map(|t| (t.begin.0, t.end.0)).collect();
        assert_eq!(spans, [(0, 60), (60, 180), (180, 300), (300, 360)]);
        assert_eq!(ins.cost, 60.0);
    }

    #[test]
    fn early_arrival_waits_for_window() {
        let req = trip(0, A, C, 0).with_window(SimTime(300), SimTime(600));
        let ins = eval(&car(0, A), &req, 0).unwrap();
        assert_eq!(labels(&ins), ["stay", "pickup", "drive", "dropoff"]);
        assert_eq!(ins.tasks[0].end, SimTime(300));
        assert_eq!(ins.pickup_at, SimTime(300));
    }

    #[test]
    fn late_arrival_rejected() {
        let req = trip(0, A, C, 0).with_window(SimTime(0), SimTime(30));
        assert_eq!(
            eval(&car(0, D), &req, 0),
            Err(RejectionReason::OutsideWindow { arrival: SimTime(180), latest: SimTime(30) })
        );
    }

    #[test]
    fn unreachable_destination() {
        assert_eq!(eval(&car(0, A), &trip(0, A, E, 0), 0), Err(RejectionReason::NoPath));
    }

    #[test]
    fn dropoff_past_horizon() {
        let v = Vehicle::new(VehicleId(0), A, SimTime(0), SimTime(200), 4).unwrap();
        assert!(matches!(
            eval(&v, &trip(0, A, C, 0), 0),
            Err(RejectionReason::BeyondHorizon { horizon_end: SimTime(200), .. })
        ));
    }

    #[test]
    fn no_seats() {
        let v = Vehicle::new(VehicleId(0), A, SimTime(0), SimTime(3_600), 0).unwrap();
        assert_eq!(eval(&v, &trip(0, A, C, 0), 0), Err(RejectionReason::NoSeats));
    }

    #[test]
    fn started_stay_is_cut_one_second_later() {
        let mut v = car(0, A);
        v.advance_task(0, TaskStatus::Started, SimTime(0)).unwrap();
        let ins = eval(&v, &trip(0, A, C, 0), 0).unwrap();
        assert_eq!(ins.depart, SimTime(1));
        assert_eq!(ins.pickup_at, SimTime(1));
    }

    #[test]
    fn ev_without_enough_energy_rejected() {
        // 2 km at 0.2 kWh/km needs 0.4 kWh.
        let r = eval(&ev(0, A, 0.3), &trip(0, A, C, 0), 0);
        match r {
            Err(RejectionReason::EnergyInfeasible { min_soc_kwh }) => {
                assert!((min_soc_kwh + 0.1).abs() < 1e-9);
            }
            other => panic!("expected energy rejection, got {other:?}"),
        }
    }

    #[test]
    fn ev_tasks_carry_energy() {
        let ins = eval(&ev(0, A, 10.0), &trip(0, A, C, 0), 0).unwrap();
        assert!(ins.tasks.iter().all(|t| t.is_energy_aware()));
        let drive = ins.tasks.iter().find(|t| matches!(t.kind, TaskKind::Drive { .. })).unwrap();
        assert!((drive.energy_kwh().unwrap() + 0.4).abs() < 1e-9);
    }
}

// ── Commit ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod committing {
    use drt_schedule::{Schedule, TaskKind, TaskStatus};

    use super::*;
    use crate::{DispatchConfig, DispatchError, InsertionContext, commit, evaluate, retract};

    #[test]
    fn commit_keeps_schedule_valid() {
        let network = line();
        let config = DispatchConfig::default();
        let mut v = car(0, B);
        for (i, now) in [(0, 0), (1, 100)] {
            let ctx = InsertionContext { network: &network, router: &DijkstraRouter, config: &config, now: SimTime(now) };
            let ins = evaluate(&ctx, &v, &trip(i, A, D, now)).unwrap();
            commit(ins, &mut v).unwrap();
            v.schedule().validate().unwrap();
        }
        let (_, stay) = v.schedule().trailing_stay().unwrap();
        assert_eq!(stay.from, D);
        assert_eq!(stay.end, SimTime(3_600));
    }

    #[test]
    fn commit_into_a_later_time_splits_the_stay() {
        let network = line();
        let config = DispatchConfig::default();
        let mut v = car(0, A);
        let ctx = InsertionContext { network: &network, router: &DijkstraRouter, config: &config, now: SimTime(500) };
        let ins = evaluate(&ctx, &v, &trip(0, A, B, 500)).unwrap();
        commit(ins, &mut v).unwrap();
        let tasks = v.schedule().tasks();
        assert!(tasks[0].is_stay());
        assert_eq!(tasks[0].end, SimTime(500));
        assert_eq!(tasks[1].kind.label(), "pickup");
    }

    fn booked_twice() -> Vehicle {
        let network = line();
        let config = DispatchConfig::default();
        let mut v = car(0, B);
        for (i, now) in [(0, 0), (1, 100)] {
            let ctx = InsertionContext { network: &network, router: &DijkstraRouter, config: &config, now: SimTime(now) };
            commit(evaluate(&ctx, &v, &trip(i, A, D, now)).unwrap(), &mut v).unwrap();
        }
        v
    }

    #[test]
    fn retract_last_trip_restores_idle_time() {
        let mut v = booked_twice();
        retract(&mut v, RequestId(1)).unwrap();
        v.schedule().validate().unwrap();
        let labels: Vec<_> = v.schedule().tasks().iter().map(|t| t.kind.label()).collect();
        assert_eq!(labels, ["drive", "pickup", "drive", "dropoff", "stay"]);
        let (_, stay) = v.schedule().trailing_stay().unwrap();
        assert_eq!((stay.from, stay.begin, stay.end), (D, SimTime(420), SimTime(3_600)));
    }

    #[test]
    fn retract_earlier_trip_keeps_the_drives() {
        let mut v = booked_twice();
        let before: Vec<_> = v.schedule().tasks().iter().map(|t| (t.begin, t.end, t.from, t.to)).collect();
        retract(&mut v, RequestId(0)).unwrap();
        v.schedule().validate().unwrap();

        let after: Vec<_> = v.schedule().tasks().iter().map(|t| (t.begin, t.end, t.from, t.to)).collect();
        assert_eq!(before, after);
        assert!(v.schedule().tasks().iter().all(|t| t.request() != Some(RequestId(0))));
        assert!(v.schedule().tasks().iter().any(|t| t.kind == TaskKind::Pickup { request: RequestId(1) }));

        // With the first trip vacated, retracting the second frees everything.
        retract(&mut v, RequestId(1)).unwrap();
        assert_eq!(v.schedule(), &Schedule::new(B, SimTime(0), SimTime(3_600)).unwrap());
    }

    #[test]
    fn retract_refused_once_pickup_started() {
        let mut v = booked_twice();
        let s = v.schedule_mut();
        s.advance(0, TaskStatus::Started, SimTime(0)).unwrap();
        s.advance(0, TaskStatus::Performed, SimTime(60)).unwrap();
        s.advance(1, TaskStatus::Started, SimTime(60)).unwrap();

        assert!(matches!(retract(&mut v, RequestId(0)), Err(DispatchError::CannotRetract { .. })));
        assert!(matches!(retract(&mut v, RequestId(7)), Err(DispatchError::CannotRetract { .. })));
        retract(&mut v, RequestId(1)).unwrap();
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod dispatcher {
    use drt_demand::{CancelReason, RequestStatus};

    use super::*;
    use crate::{DesignatedVehicles, DispatchConfig, DispatchError, Dispatcher, RejectionReason};

    fn run(fleet: &mut Fleet, reg: &mut RequestRegistry, now: u64) -> crate::DispatchReport {
        let d = Dispatcher::new(DispatchConfig::default()).unwrap();
        d.run_cycle(SimTime(now), fleet, reg, &line(), &DijkstraRouter).unwrap()
    }

    #[test]
    fn second_request_unreachable_in_window() {
        let mut fleet = Fleet::new(vec![car(0, A)]).unwrap();
        let mut reg = registry(vec![
            trip(1, A, C, 0),
            trip(2, D, A, 0).with_window(SimTime(0), SimTime(100)),
        ]);
        let report = run(&mut fleet, &mut reg, 0);

        assert_eq!(reg.status(RequestId(1)).unwrap(), &RequestStatus::Planned);
        assert_eq!(reg.status(RequestId(2)).unwrap(), &RequestStatus::Unplanned);
        assert_eq!(report.planned.len(), 1);
        assert_eq!(report.unplanned[0].request, RequestId(2));
        assert!(matches!(
            report.unplanned[0].rejections[0].reason,
            RejectionReason::OutsideWindow { .. }
        ));
        assert_eq!(reg.pending(), vec![RequestId(2)]);
    }

    #[test]
    fn cheapest_vehicle_wins() {
        let mut fleet = Fleet::new(vec![car(0, D), car(1, A)]).unwrap();
        let mut reg = registry(vec![trip(0, A, B, 0)]);
        let report = run(&mut fleet, &mut reg, 0);
        assert_eq!(report.planned[0].vehicle, VehicleId(1));
        assert_eq!(reg.get(RequestId(0)).unwrap().vehicle, Some(VehicleId(1)));
    }

    #[test]
    fn ties_go_to_lowest_id() {
        let mut fleet = Fleet::new(vec![car(0, A), car(1, A), car(2, A)]).unwrap();
        let mut reg = registry(vec![trip(0, A, B, 0)]);
        let report = run(&mut fleet, &mut reg, 0);
        assert_eq!(report.planned[0].vehicle, VehicleId(0));
    }

    #[test]
    fn earlier_submission_is_served_first() {
        let mut fleet = Fleet::new(vec![car(0, A)]).unwrap();
        let mut reg = registry(vec![trip(5, A, B, 0), trip(2, A, B, 10)]);
        let report = run(&mut fleet, &mut reg, 20);
        let order: Vec<_> = report.planned.iter().map(|a| a.request).collect();
        assert_eq!(order, [RequestId(5), RequestId(2)]);
        assert!(report.planned[0].pickup_at < report.planned[1].pickup_at);
        fleet.get(VehicleId(0)).unwrap().schedule().validate().unwrap();
    }

    #[test]
    fn designated_vehicles_only() {
        let policy: DesignatedVehicles = [(PassengerId(0), VehicleId(1))].into_iter().collect();
        let d = Dispatcher::with_policy(DispatchConfig::default(), policy).unwrap();
        let mut fleet = Fleet::new(vec![car(0, A), car(1, D)]).unwrap();
        let mut reg = registry(vec![trip(0, A, B, 0), trip(1, A, B, 0)]);
        let report = d.run_cycle(SimTime(0), &mut fleet, &mut reg, &line(), &DijkstraRouter).unwrap();

        assert_eq!(report.planned.len(), 1);
        assert_eq!(report.planned[0].vehicle, VehicleId(1));
        assert_eq!(report.unplanned[0].request, RequestId(1));
        assert!(report.unplanned[0].rejections.is_empty());
    }

    #[test]
    fn expiry_cancels_stale_requests() {
        let config = DispatchConfig { expire_after_secs: Some(60), ..Default::default() };
        let d = Dispatcher::new(config).unwrap();
        let mut fleet = Fleet::new(vec![car(0, A)]).unwrap();
        let mut reg = registry(vec![trip(0, A, B, 0), trip(1, A, B, 90)]);
        let report = d.run_cycle(SimTime(100), &mut fleet, &mut reg, &line(), &DijkstraRouter).unwrap();

        assert_eq!(report.cancelled, vec![(RequestId(0), CancelReason::Expired)]);
        assert_eq!(reg.status(RequestId(0)).unwrap(), &RequestStatus::Cancelled(CancelReason::Expired));
        assert_eq!(report.planned[0].request, RequestId(1));
    }

    #[test]
    fn closed_windows_cancelled_when_enabled() {
        let config = DispatchConfig { cancel_after_window: true, ..Default::default() };
        let d = Dispatcher::new(config).unwrap();
        let mut fleet = Fleet::new(vec![car(0, A)]).unwrap();
        let mut reg = registry(vec![trip(0, A, B, 0).with_window(SimTime(0), SimTime(50))]);
        let report = d.run_cycle(SimTime(100), &mut fleet, &mut reg, &line(), &DijkstraRouter).unwrap();
        assert_eq!(report.cancelled, vec![(RequestId(0), CancelReason::WindowClosed)]);
    }

    #[test]
    fn requests_are_kept_by_default() {
        let mut fleet = Fleet::new(vec![car(0, A)]).unwrap();
        let mut reg = registry(vec![trip(0, A, E, 0)]);
        for now in [0, 600, 1_200] {
            let report = run(&mut fleet, &mut reg, now);
            assert!(report.cancelled.is_empty());
        }
        assert_eq!(reg.pending(), vec![RequestId(0)]);
    }

    #[test]
    fn zero_service_time_rejected() {
        let config = DispatchConfig { pickup_secs: 0, ..Default::default() };
        assert!(matches!(Dispatcher::new(config), Err(DispatchError::Config(_))));
    }

    #[test]
    fn energy_rejection_leaves_request_unplanned() {
        let mut fleet = Fleet::new(vec![ev(0, A, 0.3)]).unwrap();
        let mut reg = registry(vec![trip(0, A, C, 0)]);
        let report = run(&mut fleet, &mut reg, 0);
        assert!(report.planned.is_empty());
        assert!(matches!(
            report.unplanned[0].rejections[0].reason,
            RejectionReason::EnergyInfeasible { .. }
        ));
        assert_eq!(fleet.get(VehicleId(0)).unwrap().schedule().len(), 1);
    }
}

// ── Cost functions ────────────────────────────────────────────────────────────

#[cfg(test)]
mod cost {
    use super::*;
    use crate::{CostFunction, CostInputs};

    #[test]
    fn each_function_reads_its_own_input() {
        let inputs = CostInputs { now: SimTime(100), pickup_at: SimTime(160), drive_secs: 300, drive_m: 2_500.0 };
        assert_eq!(CostFunction::PickupArrival.evaluate(&inputs), 60.0);
        assert_eq!(CostFunction::DriveTime.evaluate(&inputs), 300.0);
        assert_eq!(CostFunction::Distance.evaluate(&inputs), 2_500.0);
    }
}

// ── Charging planner ──────────────────────────────────────────────────────────

#[cfg(test)]
mod charging {
    use drt_core::ChargerId;
    use drt_ev::{ChargerLocation, ChargerSpec, ChargingInfrastructure};
    use drt_schedule::TaskKind;

    use super::*;
    use crate::{
        ChargingPlanner, ChargingPolicy, DispatchConfig, DispatchError, InsertionContext, StepGrid, commit, evaluate,
    };

    fn infra(network: &RoadNetwork, plugs: u32) -> ChargingInfrastructure {
        let spec = ChargerSpec { id: ChargerId(0), location: ChargerLocation::Node(C), power_kw: 150.0, plugs };
        ChargingInfrastructure::build(vec![spec], network).unwrap()
    }

    #[test]
    fn low_battery_goes_to_charger() {
        let network = line();
        let mut fleet = Fleet::new(vec![ev(0, A, 5.0)]).unwrap();
        let planner = ChargingPlanner::default();
        let planned = planner
            .plan(SimTime(0), &mut fleet, &infra(&network, 1), &network, &DijkstraRouter)
            .unwrap();

        assert_eq!(planned.len(), 1);
        let a = planned[0];
        assert_eq!(a.charger, ChargerId(0));
        assert_eq!(a.begin, SimTime(120));
        assert!(a.energy_kwh > 0.0);

        // 4.6 kWh on arrival; 0.8 × 50 kWh target, rounded up to whole seconds.
        let expected = profile().charge_secs_to(4.6, 150.0, 0.8);
        assert_eq!(a.end, SimTime(120 + expected));
        assert!((4.6 + a.energy_kwh - 40.0).abs() < 0.05);

        let v = fleet.get(VehicleId(0)).unwrap();
        v.schedule().validate().unwrap();
        let kinds: Vec<_> = v.schedule().tasks().iter().map(|t| t.kind.label()).collect();
        assert_eq!(kinds, ["drive", "charge", "stay"]);
        assert!(matches!(v.schedule().tasks()[1].kind, TaskKind::Charge { charger: ChargerId(0) }));
        assert_eq!(v.schedule().tasks()[2].kind, TaskKind::Stay { charger: Some(ChargerId(0)) });
    }

    #[test]
    fn plugs_are_not_overbooked() {
        let network = line();
        let mut fleet = Fleet::new(vec![ev(0, A, 5.0), ev(1, B, 5.0)]).unwrap();
        let planned = ChargingPlanner::default()
            .plan(SimTime(0), &mut fleet, &infra(&network, 1), &network, &DijkstraRouter)
            .unwrap();
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].vehicle, VehicleId(0));
        assert_eq!(fleet.get(VehicleId(1)).unwrap().schedule().len(), 1);
    }

    /// ev0 at A needs a charge right away; ev1 first drives a passenger
    /// D → C and only goes idle at C at t = 240.
    fn booked_ahead(plugs: u32) -> (Fleet, ChargingInfrastructure, Vec<crate::ChargingAssignment>) {
        let network = line();
        let config = DispatchConfig::default();
        let mut busy = ev(1, D, 5.0);
        let ctx = InsertionContext { network: &network, router: &DijkstraRouter, config: &config, now: SimTime(0) };
        commit(evaluate(&ctx, &busy, &trip(5, D, C, 0)).unwrap(), &mut busy).unwrap();
        assert_eq!(busy.schedule().trailing_stay().unwrap().1.begin, SimTime(240));

        let mut fleet = Fleet::new(vec![ev(0, A, 5.0), busy]).unwrap();
        let infra = infra(&network, plugs);
        let first = ChargingPlanner::default()
            .plan(SimTime(0), &mut fleet, &infra, &network, &DijkstraRouter)
            .unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].vehicle, VehicleId(0));
        (fleet, infra, first)
    }

    #[test]
    fn sessions_booked_in_earlier_cycles_hold_their_plug() {
        let network = line();
        let (mut fleet, infra, first) = booked_ahead(1);
        // The plug is physically free at t = 300, but ev0 holds it from 120.
        assert!(infra.occupancy(ChargerId(0)).unwrap().is_empty());
        assert!(first[0].end > SimTime(300));

        let second = ChargingPlanner::default()
            .plan(SimTime(300), &mut fleet, &infra, &network, &DijkstraRouter)
            .unwrap();
        assert!(second.is_empty());
        assert!(fleet.get(VehicleId(1)).unwrap().schedule().tasks().iter().all(|t| t.charger().is_none()));
    }

    #[test]
    fn second_plug_takes_the_overlapping_session() {
        let network = line();
        let (mut fleet, infra, _) = booked_ahead(2);
        let second = ChargingPlanner::default()
            .plan(SimTime(300), &mut fleet, &infra, &network, &DijkstraRouter)
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].vehicle, VehicleId(1));
        assert_eq!(second[0].begin, SimTime(300));
    }

    #[test]
    fn step_grid_snaps_up() {
        let grid = StepGrid { origin: SimTime(5), step_secs: 10 };
        assert_eq!(grid.snap(SimTime(5)), SimTime(5));
        assert_eq!(grid.snap(SimTime(6)), SimTime(15));
        assert_eq!(grid.snap(SimTime(15)), SimTime(15));
        assert_eq!(grid.snap(SimTime(0)), SimTime(5));
        assert_eq!(StepGrid::default().snap(SimTime(7)), SimTime(7));
    }

    #[test]
    fn healthy_and_conventional_vehicles_stay_put() {
        let network = line();
        let mut fleet = Fleet::new(vec![ev(0, A, 30.0), car(1, A)]).unwrap();
        let planned = ChargingPlanner::default()
            .plan(SimTime(0), &mut fleet, &infra(&network, 2), &network, &DijkstraRouter)
            .unwrap();
        assert!(planned.is_empty());
    }

    #[test]
    fn session_truncated_at_horizon() {
        let network = line();
        let v = Vehicle::electric(VehicleId(0), C, SimTime(0), SimTime(600), 4, profile(), 2.0).unwrap();
        let mut fleet = Fleet::new(vec![v]).unwrap();
        let planned = ChargingPlanner::default()
            .plan(SimTime(0), &mut fleet, &infra(&network, 1), &network, &DijkstraRouter)
            .unwrap();
        assert_eq!(planned[0].begin, SimTime(0));
        assert_eq!(planned[0].end, SimTime(600));
        let v = fleet.get(VehicleId(0)).unwrap();
        assert_eq!(v.schedule().len(), 1);
        assert_eq!(v.schedule().tasks()[0].kind.label(), "charge");
    }

    #[test]
    fn policy_thresholds_validated() {
        let bad = ChargingPolicy { min_soc: 0.9, target_soc: 0.5 };
        assert!(matches!(ChargingPlanner::new(bad), Err(DispatchError::Config(_))));
    }
}
