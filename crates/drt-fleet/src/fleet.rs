//! Fleet registry.

use drt_core::{NodeId, SimTime, VehicleId};
use drt_ev::EnergyProfile;
use drt_spatial::RoadNetwork;

use crate::{FleetError, FleetResult, Vehicle};

/// All vehicles of the run, indexed by dense `VehicleId`.
#[derive(Clone, Debug, Default)]
pub struct Fleet {
    vehicles: Vec<Vehicle>,
}

impl Fleet {
    /// Build a fleet from vehicles whose ids are exactly `0..n` (any order).
    pub fn new(mut vehicles: Vec<Vehicle>) -> FleetResult<Self> {
        vehicles.sort_by_key(|v| v.id);
        for (i, v) in vehicles.iter().enumerate() {
            let expected = VehicleId(i as u32);
            if v.id != expected {
                return Err(FleetError::NonDenseIds { expected, found: v.id });
            }
        }
        Ok(Self { vehicles })
    }

    /// Check every start node exists in `network`.
    pub fn validate_against(&self, network: &RoadNetwork) -> FleetResult<()> {
        for v in &self.vehicles {
            network.check_node(v.start_node)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn get(&self, id: VehicleId) -> FleetResult<&Vehicle> {
        self.vehicles.get(id.index()).ok_or(FleetError::VehicleNotFound(id))
    }

    /// The exclusive per-vehicle handle used by schedule commits.
    pub fn get_mut(&mut self, id: VehicleId) -> FleetResult<&mut Vehicle> {
        self.vehicles.get_mut(id.index()).ok_or(FleetError::VehicleNotFound(id))
    }

    /// Vehicles in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.iter()
    }

    /// Mutable slice in ascending id order, for per-vehicle parallel work.
    pub fn as_mut_slice(&mut self) -> &mut [Vehicle] {
        &mut self.vehicles
    }

    pub fn available_position_time(&self, id: VehicleId, now: SimTime) -> FleetResult<(NodeId, SimTime)> {
        Ok(self.get(id)?.available_position_time(now))
    }

    /// Ids of vehicles matching `pred`, ascending.
    pub fn vehicles_of<P>(&self, pred: P) -> Vec<VehicleId>
    where
        P: Fn(&Vehicle) -> bool,
    {
        self.vehicles.iter().filter(|v| pred(v)).map(|v| v.id).collect()
    }
}

// ── FleetBuilder ──────────────────────────────────────────────────────────────

/// Fluent construction with sequential ids.
///
/// ```
/// use drt_core::{NodeId, SimTime};
/// use drt_fleet::FleetBuilder;
///
/// let fleet = FleetBuilder::new(SimTime(0), SimTime(3_600))
///     .vehicle(NodeId(0), 4)
///     .vehicle(NodeId(3), 4)
///     .build()
///     .unwrap();
/// assert_eq!(fleet.len(), 2);
/// ```
pub struct FleetBuilder {
    start: SimTime,
    end: SimTime,
    pending: Vec<Pending>,
}

struct Pending {
    node: NodeId,
    capacity: u32,
    energy: Option<(EnergyProfile, f64)>,
}

impl FleetBuilder {
    /// Every vehicle added will operate over `[start, end)`.
    pub fn new(start: SimTime, end: SimTime) -> Self {
        Self { start, end, pending: Vec::new() }
    }

    pub fn vehicle(mut self, node: NodeId, capacity: u32) -> Self {
        self.pending.push(Pending { node, capacity, energy: None });
        self
    }

    /// An electric vehicle at `node` with `soc_kwh` in the battery.
    pub fn electric(mut self, node: NodeId, capacity: u32, profile: EnergyProfile, soc_kwh: f64) -> Self {
        self.pending.push(Pending { node, capacity, energy: Some((profile, soc_kwh)) });
        self
    }

    pub fn build(self) -> FleetResult<Fleet> {
        let vehicles = self
            .pending
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                let id = VehicleId(i as u32);
                match p.energy {
                    None => Vehicle::new(id, p.node, self.start, self.end, p.capacity),
                    Some((profile, soc)) => {
                        Vehicle::electric(id, p.node, self.start, self.end, p.capacity, profile, soc)
                    }
                }
            })
            .collect::<FleetResult<Vec<_>>>()?;
        Ok(Fleet { vehicles })
    }
}
