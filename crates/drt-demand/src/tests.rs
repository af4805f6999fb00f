//! Unit tests for drt-demand.

use drt_core::{NodeId, PassengerId, RequestId, SimTime, VehicleId};

use crate::{CancelReason, DemandError, Request, RequestRegistry, RequestStatus};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn req(id: u32, submitted: u64) -> Request {
    Request::new(RequestId(id), PassengerId(id), NodeId(0), NodeId(1), SimTime(submitted))
}

fn registry_with(ids: &[u32]) -> RequestRegistry {
    let mut reg = RequestRegistry::new();
    for &id in ids {
        reg.submit(req(id, id as u64 * 10)).unwrap();
    }
    reg
}

// ── Submission ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod submission {
    use super::*;

    #[test]
    fn submit_is_unplanned_and_pending() {
        let reg = registry_with(&[3, 1, 2]);
        assert_eq!(reg.pending(), vec![RequestId(3), RequestId(1), RequestId(2)]);
        assert_eq!(reg.status(RequestId(1)).unwrap(), &RequestStatus::Unplanned);
        assert_eq!(reg.active_count(), 3);
    }

    #[test]
    fn duplicate_rejected_even_after_archive() {
        let mut reg = registry_with(&[0]);
        assert!(matches!(reg.submit(req(0, 5)), Err(DemandError::DuplicateRequest(_))));
        reg.mark_cancelled(RequestId(0), CancelReason::Expired, SimTime(50)).unwrap();
        assert!(matches!(reg.submit(req(0, 60)), Err(DemandError::DuplicateRequest(_))));
    }

    #[test]
    fn inverted_window_rejected() {
        let mut reg = RequestRegistry::new();
        let r = req(0, 0).with_window(SimTime(100), SimTime(50));
        assert!(matches!(reg.submit(r), Err(DemandError::InvalidRequest { .. })));
        assert_eq!(reg.unplanned_count(), 0);
    }

    #[test]
    fn unknown_request() {
        let reg = RequestRegistry::new();
        assert!(matches!(reg.get(RequestId(9)), Err(DemandError::RequestNotFound(_))));
    }
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use super::*;

    #[test]
    fn full_trip() {
        let mut reg = registry_with(&[0, 1]);
        reg.mark_planned(RequestId(0), VehicleId(4), SimTime(100), SimTime(400)).unwrap();
        assert_eq!(reg.pending(), vec![RequestId(1)]);

        reg.mark_picked_up(RequestId(0), SimTime(105)).unwrap();
        assert!(reg.get(RequestId(0)).unwrap().is_onboard());

        reg.mark_performed(RequestId(0), SimTime(410)).unwrap();
        let entry = reg.get(RequestId(0)).unwrap();
        assert_eq!(entry.status, RequestStatus::Performed);
        assert_eq!(entry.vehicle, Some(VehicleId(4)));
        assert_eq!(entry.planned_pickup, Some(SimTime(100)));
        assert_eq!(entry.dropped_off_at, Some(SimTime(410)));
        assert_eq!(entry.wait_secs(), Some(105));
        assert!(!entry.is_onboard());
        assert_eq!(reg.archived_count(), 1);
        assert_eq!(reg.active_count(), 1);
    }

    #[test]
    fn cannot_plan_twice() {
        let mut reg = registry_with(&[0]);
        reg.mark_planned(RequestId(0), VehicleId(0), SimTime(1), SimTime(2)).unwrap();
        assert!(matches!(
            reg.mark_planned(RequestId(0), VehicleId(1), SimTime(1), SimTime(2)),
            Err(DemandError::InvalidTransition { to: "planned", .. })
        ));
    }

    #[test]
    fn cannot_perform_unplanned() {
        let mut reg = registry_with(&[0]);
        assert!(reg.mark_performed(RequestId(0), SimTime(5)).is_err());
        assert!(reg.mark_picked_up(RequestId(0), SimTime(5)).is_err());
    }

    #[test]
    fn planned_can_be_cancelled() {
        let mut reg = registry_with(&[0]);
        reg.mark_planned(RequestId(0), VehicleId(0), SimTime(1), SimTime(2)).unwrap();
        reg.mark_cancelled(RequestId(0), CancelReason::Withdrawn("no-show".into()), SimTime(3)).unwrap();
        assert!(matches!(reg.status(RequestId(0)).unwrap(), RequestStatus::Cancelled(_)));
    }

    #[test]
    fn final_states_are_final() {
        let mut reg = registry_with(&[0]);
        reg.mark_cancelled(RequestId(0), CancelReason::WindowClosed, SimTime(9)).unwrap();
        assert!(reg.mark_planned(RequestId(0), VehicleId(0), SimTime(1), SimTime(2)).is_err());
        assert!(reg.mark_cancelled(RequestId(0), CancelReason::Expired, SimTime(9)).is_err());
        assert!(reg.pending().is_empty());
        assert!(reg.status(RequestId(0)).unwrap().is_final());
    }
}

// ── CSV loader ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::Cursor;

    use super::*;
    use crate::load_requests_reader;

    #[test]
    fn sorted_by_submission() {
        let csv = "request_id,passenger_id,origin,destination,submit_time,earliest,latest\n\
                   0,0,4,17,300,,\n\
                   1,5,8,2,100,200,500\n";
        let reqs = load_requests_reader(Cursor::new(csv)).unwrap();
        assert_eq!(reqs[0].id, RequestId(1));
        assert_eq!(reqs[0].window.unwrap().latest, SimTime(500));
        assert_eq!(reqs[1].origin, NodeId(4));
        assert!(reqs[1].window.is_none());
    }

    #[test]
    fn half_window_rejected() {
        let csv = "request_id,passenger_id,origin,destination,submit_time,earliest,latest\n\
                   0,0,4,17,300,400,\n";
        assert!(matches!(load_requests_reader(Cursor::new(csv)), Err(DemandError::Parse(_))));
    }
}

// ── Random demand ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod random {
    use drt_core::GeoPoint;
    use drt_spatial::{RoadNetwork, RoadNetworkBuilder};

    use super::*;
    use crate::{RandomDemand, RandomDemandConfig};

    fn net(n: usize) -> RoadNetwork {
        let mut b = RoadNetworkBuilder::new();
        for i in 0..n {
            b.add_node(GeoPoint::new(0.0, i as f32 * 0.01));
        }
        b.build()
    }

    fn cfg() -> RandomDemandConfig {
        RandomDemandConfig {
            mean_interarrival_secs: 30.0,
            lead_secs: Some(300),
            window_secs: 600,
            start: SimTime(0),
            end: SimTime(3_600),
        }
    }

    #[test]
    fn same_seed_same_requests() {
        let network = net(10);
        let a = RandomDemand::new(cfg(), 11).generate(&network);
        let b = RandomDemand::new(cfg(), 11).generate(&network);
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn requests_are_well_formed() {
        let network = net(5);
        let reqs = RandomDemand::new(cfg(), 3).generate(&network);
        for (i, r) in reqs.iter().enumerate() {
            assert_eq!(r.id, RequestId(i as u32));
            assert_ne!(r.origin, r.destination);
            assert!(r.origin.index() < 5 && r.destination.index() < 5);
            assert!(r.submitted < SimTime(3_600));
            let w = r.window.unwrap();
            assert_eq!(w.earliest, r.submitted.offset(300));
        }
        assert!(reqs.windows(2).all(|w| w[0].submitted <= w[1].submitted));
    }

    #[test]
    fn tiny_network_yields_nothing() {
        assert!(RandomDemand::new(cfg(), 1).generate(&net(1)).is_empty());
    }
}
