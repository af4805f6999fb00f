//! End-to-end scenario tests for drt-sim.

use std::sync::Arc;

use drt_core::{ChargerId, GeoPoint, NodeId, PassengerId, RequestId, SimConfig, SimTime, VehicleId};
use drt_demand::{Request, RequestStatus};
use drt_dispatch::CandidatePolicy;
use drt_ev::{ChargerLocation, ChargerSpec, ChargingCurve, EnergyProfile};
use drt_fleet::{Fleet, FleetBuilder};
use drt_mobility::{Activity, TaskEvent, TaskPhase};
use drt_spatial::{DijkstraRouter, RoadNetwork, RoadNetworkBuilder, Router};

use crate::{NoopObserver, Sim, SimBuilder, SimError, SimObserver};

// ── Helpers ───────────────────────────────────────────────────────────────────

const A: NodeId = NodeId(0);
const B: NodeId = NodeId(1);
const C: NodeId = NodeId(2);
const D: NodeId = NodeId(3);

/// A ─ B ─ C ─ D, 1 km and 60 s per hop.
fn line() -> RoadNetwork {
    let mut b = RoadNetworkBuilder::new();
    for i in 0..4 {
        b.add_node(GeoPoint::new(0.0, i as f32 * 0.01));
    }
    b.add_road(A, B, 1_000.0, 60_000);
    b.add_road(B, C, 1_000.0, 60_000);
    b.add_road(C, D, 1_000.0, 60_000);
    b.build()
}

/// 10 s steps, dispatch every step.
fn config(end: u64) -> SimConfig {
    SimConfig {
        start_time: SimTime(0),
        end_time: SimTime(end),
        step_secs: 10,
        dispatch_interval_steps: 1,
        seed: 7,
        num_threads: Some(1),
    }
}

fn cars(nodes: &[NodeId]) -> Fleet {
    nodes
        .iter()
        .fold(FleetBuilder::new(SimTime(0), SimTime(3_600)), |b, &n| b.vehicle(n, 4))
        .build()
        .unwrap()
}

fn profile() -> EnergyProfile {
    EnergyProfile::new(50.0, Arc::new(ChargingCurve::tesla())).with_consumption(0.2, 0.0)
}

fn one_ev(node: NodeId, soc_kwh: f64) -> Fleet {
    FleetBuilder::new(SimTime(0), SimTime(3_600))
        .electric(node, 4, profile(), soc_kwh)
        .build()
        .unwrap()
}

fn trip(id: u32, origin: NodeId, destination: NodeId, submitted: u64) -> Request {
    Request::new(RequestId(id), PassengerId(id), origin, destination, SimTime(submitted))
}

fn sim(end: u64, fleet: Fleet, requests: Vec<Request>) -> Sim<DijkstraRouter> {
    SimBuilder::new(config(end), line(), fleet, DijkstraRouter)
        .requests(requests)
        .build()
        .unwrap()
}

/// Records every task event of a run.
#[derive(Default)]
struct EventLog(Vec<TaskEvent>);

impl SimObserver for EventLog {
    fn on_events(&mut self, _now: SimTime, events: &[TaskEvent]) {
        self.0.extend_from_slice(events);
    }
}

/// Replay what every electric vehicle still has to do, starting from its
/// battery, and return the lowest charge reached.
fn lowest_planned_soc<R: Router, C: CandidatePolicy>(sim: &Sim<R, C>) -> f64 {
    let mut lowest = f64::INFINITY;
    for v in sim.fleet().iter() {
        let Some(battery) = v.battery() else {
            continue;
        };
        let mut soc = battery.soc_kwh();
        lowest = lowest.min(soc);
        for (_, task) in v.schedule().unperformed() {
            soc = (soc + task.energy_kwh().unwrap_or(0.0)).min(battery.capacity_kwh());
            lowest = lowest.min(soc);
        }
    }
    lowest
}

/// No charge session was forfeited and every ended task changed the
/// battery by exactly what its schedule planned.
fn assert_energy_as_planned<R: Router, C: CandidatePolicy>(sim: &Sim<R, C>, events: &[TaskEvent]) {
    for e in events {
        assert!(!matches!(e.activity, Activity::Charge { plugged: false, .. }), "forfeited: {e:?}");
        if let (TaskPhase::Ended, Some(applied)) = (e.phase, e.energy_kwh) {
            let task = sim.fleet().get(e.vehicle).unwrap().task(e.index).unwrap();
            let planned = task.energy_kwh().unwrap();
            assert!((applied - planned).abs() < 1e-6, "{e:?}: applied {applied} kWh, planned {planned} kWh");
        }
    }
}

fn rank(status: &RequestStatus) -> u8 {
    match status {
        RequestStatus::Unplanned => 0,
        RequestStatus::Planned => 1,
        RequestStatus::Performed | RequestStatus::Cancelled(_) => 2,
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use drt_dispatch::ChargingPolicy;

    use super::*;

    #[test]
    fn empty_time_range_rejected() {
        let result = SimBuilder::new(config(0), line(), cars(&[A]), DijkstraRouter).build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn vehicle_off_network_rejected() {
        let result = SimBuilder::new(config(600), line(), cars(&[NodeId(9)]), DijkstraRouter).build();
        assert!(matches!(result, Err(SimError::Fleet(_))));
    }

    #[test]
    fn request_off_network_rejected() {
        let result = SimBuilder::new(config(600), line(), cars(&[A]), DijkstraRouter)
            .requests(vec![trip(0, A, NodeId(9), 0)])
            .build();
        assert!(matches!(result, Err(SimError::Spatial(_))));
    }

    #[test]
    fn bad_charging_policy_rejected() {
        let result = SimBuilder::new(config(600), line(), cars(&[A]), DijkstraRouter)
            .charging_policy(ChargingPolicy { min_soc: 0.9, target_soc: 0.5 })
            .build();
        assert!(matches!(result, Err(SimError::Dispatch(_))));
    }

    #[test]
    fn chargers_resolved_against_network() {
        let spec = ChargerSpec { id: ChargerId(0), location: ChargerLocation::Node(C), power_kw: 22.0, plugs: 2 };
        let sim = SimBuilder::new(config(600), line(), cars(&[A]), DijkstraRouter)
            .chargers(vec![spec])
            .build()
            .unwrap();
        assert_eq!(sim.chargers().len(), 1);
        assert!(sim.charger_occupancy(ChargerId(0)).unwrap().is_empty());
        assert!(sim.charger_occupancy(ChargerId(5)).is_err());
    }
}

// ── Dispatch scenarios ────────────────────────────────────────────────────────

#[cfg(test)]
mod scenarios {
    use super::*;

    #[test]
    fn second_request_unreachable_in_window() {
        let r1 = trip(1, A, B, 0);
        let r2 = trip(2, D, A, 0).with_window(SimTime(0), SimTime(30));
        let mut sim = sim(600, cars(&[A]), vec![r1, r2]);

        sim.run_steps(1, &mut NoopObserver).unwrap();
        assert_eq!(sim.request_status(RequestId(1)).unwrap(), RequestStatus::Planned);
        assert_eq!(sim.request_status(RequestId(2)).unwrap(), RequestStatus::Unplanned);
        assert_eq!(sim.request_entry(RequestId(1)).unwrap().vehicle, Some(VehicleId(0)));
    }

    #[test]
    fn exhausting_trip_rejected_without_charging() {
        let mut sim = sim(600, one_ev(A, 0.1), vec![trip(0, A, D, 0)]);
        sim.run_steps(3, &mut NoopObserver).unwrap();
        assert_eq!(sim.request_status(RequestId(0)).unwrap(), RequestStatus::Unplanned);
        assert_eq!(sim.stats().planned, 0);
        assert_eq!(sim.schedule_snapshot(VehicleId(0)).unwrap().len(), 1);
    }

    #[test]
    fn earlier_submission_served_first() {
        // Only one of two window-bound trips fits; submission order decides.
        let first = trip(0, A, D, 10).with_window(SimTime(20), SimTime(300));
        let second = trip(1, A, D, 15).with_window(SimTime(20), SimTime(300));
        let config = SimConfig { dispatch_interval_steps: 2, ..config(600) };
        let mut sim = SimBuilder::new(config, line(), cars(&[A]), DijkstraRouter)
            .requests(vec![second, first])
            .build()
            .unwrap();

        sim.run_steps(3, &mut NoopObserver).unwrap();
        assert_eq!(sim.request_status(RequestId(0)).unwrap(), RequestStatus::Planned);
        assert_eq!(sim.request_status(RequestId(1)).unwrap(), RequestStatus::Unplanned);
    }

    #[test]
    fn request_completes() {
        let mut sim = sim(1_200, cars(&[A]), vec![trip(0, A, C, 0)]);
        sim.run(&mut NoopObserver).unwrap();

        assert_eq!(sim.request_status(RequestId(0)).unwrap(), RequestStatus::Performed);
        let entry = sim.request_entry(RequestId(0)).unwrap();
        let (picked, dropped) = (entry.picked_up_at.unwrap(), entry.dropped_off_at.unwrap());
        assert!(picked < dropped);
        assert_eq!(Some(dropped), entry.planned_dropoff.map(|t| t.offset(60)));
        assert_eq!(sim.stats().picked_up, 1);
        assert_eq!(sim.stats().performed, 1);
        assert_eq!(sim.vehicle_position(VehicleId(0)), Some((C, C, 1.0)));
    }

    #[test]
    fn late_submission_is_queued() {
        let mut sim = sim(600, cars(&[A]), vec![]);
        sim.submit(trip(0, A, B, 100)).unwrap();
        assert_eq!(sim.queued_requests(), 1);
        assert!(sim.request_status(RequestId(0)).is_err());

        sim.run_steps(11, &mut NoopObserver).unwrap();
        assert_eq!(sim.queued_requests(), 0);
        assert_eq!(sim.request_status(RequestId(0)).unwrap(), RequestStatus::Planned);
    }

    #[test]
    fn withdraw_before_pickup_frees_the_vehicle() {
        let r2 = trip(2, D, A, 0).with_window(SimTime(0), SimTime(30));
        let mut sim = sim(600, cars(&[A]), vec![trip(1, A, B, 0), r2]);
        sim.run_steps(1, &mut NoopObserver).unwrap();
        assert_eq!(sim.request_status(RequestId(1)).unwrap(), RequestStatus::Planned);

        sim.withdraw(RequestId(1), "changed plans").unwrap();
        sim.withdraw(RequestId(2), "changed plans").unwrap();
        for id in [1, 2] {
            assert!(matches!(sim.request_status(RequestId(id)).unwrap(), RequestStatus::Cancelled(_)));
        }
        assert_eq!(sim.stats().cancelled, 2);

        let schedule = sim.schedule_snapshot(VehicleId(0)).unwrap();
        schedule.validate().unwrap();
        assert!(schedule.tasks().iter().all(|t| t.is_stay()));

        sim.run(&mut NoopObserver).unwrap();
        assert_eq!(sim.stats().picked_up, 0);
        assert_eq!(sim.vehicle_position(VehicleId(0)), Some((A, A, 1.0)));
    }

    #[test]
    fn withdraw_refused_once_boarding_started() {
        let mut sim = sim(600, cars(&[A]), vec![trip(1, A, B, 0)]);
        sim.run_steps(2, &mut NoopObserver).unwrap();

        assert!(matches!(sim.withdraw(RequestId(1), "too late"), Err(SimError::Dispatch(_))));
        assert_eq!(sim.request_status(RequestId(1)).unwrap(), RequestStatus::Planned);
        assert_eq!(sim.stats().cancelled, 0);

        sim.run(&mut NoopObserver).unwrap();
        assert_eq!(sim.request_status(RequestId(1)).unwrap(), RequestStatus::Performed);
    }

    #[test]
    fn withdrawing_an_earlier_trip_keeps_the_next_one() {
        let mut sim = sim(600, cars(&[A]), vec![trip(1, A, B, 0), trip(2, B, C, 0)]);
        sim.run_steps(1, &mut NoopObserver).unwrap();
        assert_eq!(sim.request_entry(RequestId(2)).unwrap().vehicle, Some(VehicleId(0)));

        sim.withdraw(RequestId(1), "changed plans").unwrap();
        sim.run(&mut NoopObserver).unwrap();

        assert!(matches!(sim.request_status(RequestId(1)).unwrap(), RequestStatus::Cancelled(_)));
        assert_eq!(sim.request_status(RequestId(2)).unwrap(), RequestStatus::Performed);
        assert_eq!(sim.stats().picked_up, 1);
        assert_eq!(sim.vehicle_position(VehicleId(0)), Some((C, C, 1.0)));
    }

    #[test]
    fn finished_requests_cannot_be_withdrawn() {
        let mut sim = sim(600, cars(&[A]), vec![trip(1, A, B, 0)]);
        sim.run(&mut NoopObserver).unwrap();
        assert!(sim.withdraw(RequestId(1), "late").is_err());
        assert_eq!(sim.request_status(RequestId(1)).unwrap(), RequestStatus::Performed);
    }
}

// ── Invariants over a run ─────────────────────────────────────────────────────

#[cfg(test)]
mod invariants {
    use drt_demand::{RandomDemand, RandomDemandConfig};

    use super::*;

    #[test]
    fn schedules_stay_valid_and_statuses_only_move_forward() {
        let network = line();
        let demand = RandomDemandConfig { mean_interarrival_secs: 45.0, end: SimTime(1_000), ..Default::default() };
        let requests = RandomDemand::new(demand, 11).generate(&network);
        let n = requests.len();
        let mut sim = SimBuilder::new(config(1_800), network, cars(&[A, D]), DijkstraRouter)
            .requests(requests)
            .build()
            .unwrap();

        let mut seen = vec![0u8; n];
        while sim.now() < sim.config.end_time {
            sim.run_steps(1, &mut NoopObserver).unwrap();
            for v in sim.fleet().iter() {
                v.schedule().validate().unwrap();
            }
            for (i, last) in seen.iter_mut().enumerate() {
                if let Ok(status) = sim.request_status(RequestId(i as u32)) {
                    let now = rank(&status);
                    assert!(now >= *last, "request {i} went backwards");
                    *last = now;
                }
            }
        }
        assert_eq!(sim.stats().submitted, n);
        assert!(sim.stats().planned > 0);
    }

    #[test]
    fn electric_fleet_never_plans_below_empty() {
        let network = line();
        let demand = RandomDemandConfig { mean_interarrival_secs: 40.0, end: SimTime(2_400), ..Default::default() };
        let requests = RandomDemand::new(demand, 23).generate(&network);
        let small = EnergyProfile::new(10.0, Arc::new(ChargingCurve::tesla())).with_consumption(0.8, 0.0);
        let fleet = FleetBuilder::new(SimTime(0), SimTime(3_600))
            .electric(A, 4, small.clone(), 1.5)
            .electric(B, 4, small.clone(), 4.0)
            .electric(D, 4, small, 6.0)
            .build()
            .unwrap();
        let charger = ChargerSpec { id: ChargerId(0), location: ChargerLocation::Node(B), power_kw: 22.0, plugs: 1 };
        let mut sim = SimBuilder::new(config(3_600), network, fleet, DijkstraRouter)
            .chargers(vec![charger])
            .requests(requests)
            .build()
            .unwrap();

        let mut log = EventLog::default();
        while sim.now() < sim.config.end_time {
            sim.run_steps(1, &mut log).unwrap();
            for v in sim.fleet().iter() {
                v.schedule().validate().unwrap();
            }
            let lowest = lowest_planned_soc(&sim);
            assert!(lowest >= -1e-9, "planned charge drops to {lowest} kWh at {}", sim.now());
            for c in sim.chargers().iter() {
                assert!(c.occupancy().len() <= c.plugs as usize);
            }
        }
        assert_energy_as_planned(&sim, &log.0);
        assert!(sim.stats().charging_planned > 0);
        assert!(sim.stats().planned > 0);
    }
}

// ── Charging ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod charging {
    use super::*;

    fn charger_at_c() -> ChargerSpec {
        ChargerSpec { id: ChargerId(0), location: ChargerLocation::Node(C), power_kw: 150.0, plugs: 1 }
    }

    #[test]
    fn low_battery_vehicle_charges_and_unplugs() {
        let mut sim = SimBuilder::new(config(3_600), line(), one_ev(B, 5.0), DijkstraRouter)
            .chargers(vec![charger_at_c()])
            .build()
            .unwrap();

        sim.run_steps(10, &mut NoopObserver).unwrap();
        assert_eq!(sim.stats().charging_planned, 1);
        assert_eq!(sim.charger_occupancy(ChargerId(0)).unwrap(), vec![VehicleId(0)]);

        sim.run(&mut NoopObserver).unwrap();
        assert!(sim.charger_occupancy(ChargerId(0)).unwrap().is_empty());
        assert_eq!(sim.stats().charging_completed, 1);
        assert!(sim.stats().energy_charged_kwh > 30.0);
        let soc = sim.fleet().get(VehicleId(0)).unwrap().battery().unwrap().soc_kwh();
        assert!(soc > 35.0);

        let schedule = sim.schedule_snapshot(VehicleId(0)).unwrap();
        let (_, parked) = schedule.trailing_stay().unwrap();
        assert_eq!(parked.charger(), Some(ChargerId(0)));
        assert_eq!(parked.from, C);
    }

    /// ev1 goes idle at D long before ev0 reaches the single plug there,
    /// and ev0's next passenger depends on that charge.
    #[test]
    fn plug_booked_by_an_earlier_cycle_is_not_given_away() {
        let thirsty = EnergyProfile::new(50.0, Arc::new(ChargingCurve::tesla())).with_consumption(0.3, 0.0);
        let fleet = FleetBuilder::new(SimTime(0), SimTime(3_600))
            .electric(A, 4, thirsty.clone(), 1.0)
            .electric(D, 4, thirsty, 4.0)
            .build()
            .unwrap();
        let plug = ChargerSpec { id: ChargerId(1), location: ChargerLocation::Node(D), power_kw: 150.0, plugs: 1 };
        let dispatch = drt_dispatch::DispatchConfig { pickup_secs: 30, dropoff_secs: 30, ..Default::default() };
        let designated: drt_dispatch::DesignatedVehicles =
            [(PassengerId(0), VehicleId(1)), (PassengerId(1), VehicleId(0))].into_iter().collect();
        let mut sim = SimBuilder::new(config(3_600), line(), fleet, DijkstraRouter)
            .chargers(vec![plug])
            .requests(vec![trip(0, D, D, 0), trip(1, D, A, 300)])
            .dispatch_config(dispatch)
            .policy(designated)
            .build()
            .unwrap();

        let mut log = EventLog::default();
        sim.run_steps(8, &mut log).unwrap();
        // ev1 dropped its passenger at 61 and is idle next to a free plug.
        assert!(sim.charger_occupancy(ChargerId(1)).unwrap().is_empty());
        let idle = sim.schedule_snapshot(VehicleId(1)).unwrap();
        assert!(idle.tasks().iter().all(|t| t.docks_at().is_none()));

        while sim.now() < sim.config.end_time {
            sim.run_steps(1, &mut log).unwrap();
            assert!(lowest_planned_soc(&sim) >= -1e-9);
        }
        assert_energy_as_planned(&sim, &log.0);
        assert_eq!(sim.request_status(RequestId(1)).unwrap(), RequestStatus::Performed);

        // The two sessions on the plug never share a step.
        let sessions: Vec<_> = [VehicleId(0), VehicleId(1)]
            .iter()
            .flat_map(|&v| {
                let schedule = sim.schedule_snapshot(v).unwrap();
                schedule.tasks().iter().filter(|t| t.docks_at().is_some()).map(|t| (t.begin, t.end)).collect::<Vec<_>>()
            })
            .collect();
        assert_eq!(sessions.len(), 2);
        let (first, second) = (sessions[0], sessions[1]);
        assert!(first.1 < second.0, "{first:?} then {second:?}");
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use drt_dispatch::DispatchReport;

    use super::*;
    use crate::{SimObserver, SimStats};

    #[derive(Default)]
    struct Counter {
        steps: u64,
        dispatches: u64,
        ended: u64,
    }

    impl SimObserver for Counter {
        fn on_step_end(&mut self, _now: SimTime) {
            self.steps += 1;
        }

        fn on_dispatch(&mut self, _report: &DispatchReport) {
            self.dispatches += 1;
        }

        fn on_sim_end(&mut self, _now: SimTime, _stats: &SimStats) {
            self.ended += 1;
        }
    }

    #[test]
    fn hooks_follow_the_dispatch_cadence() {
        let config = SimConfig { dispatch_interval_steps: 3, ..config(70) };
        let mut sim = SimBuilder::new(config, line(), cars(&[A]), DijkstraRouter).build().unwrap();
        let mut counter = Counter::default();
        sim.run(&mut counter).unwrap();

        assert_eq!(counter.steps, 7);
        assert_eq!(counter.dispatches, 3);
        assert_eq!(counter.ended, 1);
        assert_eq!(sim.stats().dispatch_cycles, 3);
    }
}
