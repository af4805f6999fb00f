//! Candidate vehicle selection.

use rustc_hash::FxHashMap;

use drt_core::{PassengerId, VehicleId};
use drt_demand::Request;
use drt_fleet::Fleet;

/// Chooses which vehicles are evaluated for a request.
///
/// `Send + Sync` so a policy can be shared with worker threads; policies are
/// read-only during a cycle.
pub trait CandidatePolicy: Send + Sync {
    /// Vehicles worth evaluating for `request`, in any order.  Ids not in
    /// the fleet are skipped by the dispatcher.
    fn candidates(&self, request: &Request, fleet: &Fleet) -> Vec<VehicleId>;
}

/// Every vehicle in the fleet is a candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllVehicles;

impl CandidatePolicy for AllVehicles {
    fn candidates(&self, _request: &Request, fleet: &Fleet) -> Vec<VehicleId> {
        fleet.vehicles_of(|_| true)
    }
}

/// Passengers may only ride their own designated vehicles, as in a private
/// chauffeur service.  Passengers without an entry get no candidates.
#[derive(Debug, Default, Clone)]
pub struct DesignatedVehicles {
    by_passenger: FxHashMap<PassengerId, Vec<VehicleId>>,
}

impl DesignatedVehicles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, passenger: PassengerId, vehicle: VehicleId) -> &mut Self {
        let list = self.by_passenger.entry(passenger).or_default();
        if !list.contains(&vehicle) {
            list.push(vehicle);
        }
        self
    }

    pub fn vehicles_for(&self, passenger: PassengerId) -> &[VehicleId] {
        self.by_passenger.get(&passenger).map_or(&[], Vec::as_slice)
    }
}

impl FromIterator<(PassengerId, VehicleId)> for DesignatedVehicles {
    fn from_iter<I: IntoIterator<Item = (PassengerId, VehicleId)>>(iter: I) -> Self {
        let mut policy = Self::new();
        for (p, v) in iter {
            policy.assign(p, v);
        }
        policy
    }
}

impl CandidatePolicy for DesignatedVehicles {
    fn candidates(&self, request: &Request, _fleet: &Fleet) -> Vec<VehicleId> {
        self.vehicles_for(request.passenger).to_vec()
    }
}
