//! Charger registry and plug occupancy.
//!
//! The registry is built once from static [`ChargerSpec`]s joined against the
//! road network and is read-only afterwards, except for plug occupancy.
//! Occupancy sits behind one `Mutex` per charger so vehicles executing their
//! schedules on different worker threads can plug in concurrently without
//! ever exceeding the plug count.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use drt_core::{ChargerId, GeoPoint, NodeId, VehicleId};
use drt_spatial::RoadNetwork;

use crate::{EvError, EvResult};

// ── Specification ─────────────────────────────────────────────────────────────

/// Where a charger is: a network node, or a coordinate snapped to the
/// nearest node at build time.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChargerLocation {
    Node(NodeId),
    Coord(GeoPoint),
}

/// Static charger description.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChargerSpec {
    pub id: ChargerId,
    pub location: ChargerLocation,
    /// Rated power in kW.  Must be positive.
    pub power_kw: f64,
    /// Number of vehicles that can charge at once.  At least 1.
    pub plugs: u32,
}

// ── Charger ───────────────────────────────────────────────────────────────────

/// A charger bound to a network node.
#[derive(Debug)]
pub struct Charger {
    pub id: ChargerId,
    pub node: NodeId,
    pub power_kw: f64,
    pub plugs: u32,
    plugged: Mutex<Vec<VehicleId>>,
}

impl Charger {
    fn lock(&self) -> MutexGuard<'_, Vec<VehicleId>> {
        self.plugged.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Plug `vehicle` in.  Plugging in a vehicle that is already plugged in
    /// is a no-op.
    pub fn occupy(&self, vehicle: VehicleId) -> EvResult<()> {
        let mut plugged = self.lock();
        if plugged.contains(&vehicle) {
            return Ok(());
        }
        if plugged.len() >= self.plugs as usize {
            return Err(EvError::ChargerAtCapacity { charger: self.id, vehicle, plugs: self.plugs });
        }
        plugged.push(vehicle);
        Ok(())
    }

    /// Unplug `vehicle`.  Returns `false` if it was not plugged in.
    pub fn release(&self, vehicle: VehicleId) -> bool {
        let mut plugged = self.lock();
        match plugged.iter().position(|&v| v == vehicle) {
            Some(i) => {
                plugged.swap_remove(i);
                true
            }
            None => false,
        }
    }

    /// Vehicles currently plugged in, ascending id.
    pub fn occupancy(&self) -> Vec<VehicleId> {
        let mut v = self.lock().clone();
        v.sort_unstable();
        v
    }

    pub fn free_plugs(&self) -> u32 {
        self.plugs.saturating_sub(self.lock().len() as u32)
    }
}

// ── ChargingInfrastructure ────────────────────────────────────────────────────

/// Registry `ChargerId → Charger`, iterated in ascending id order.
#[derive(Debug, Default)]
pub struct ChargingInfrastructure {
    chargers: BTreeMap<ChargerId, Charger>,
}

impl ChargingInfrastructure {
    /// Validate the specs and resolve every location to a network node.
    pub fn build(specs: Vec<ChargerSpec>, network: &RoadNetwork) -> EvResult<Self> {
        let mut chargers = BTreeMap::new();
        for spec in specs {
            if !(spec.power_kw.is_finite() && spec.power_kw > 0.0) {
                return Err(EvError::InvalidCharger {
                    id: spec.id,
                    reason: format!("rated power must be positive, got {} kW", spec.power_kw),
                });
            }
            if spec.plugs == 0 {
                return Err(EvError::InvalidCharger { id: spec.id, reason: "no plugs".into() });
            }
            let node = match spec.location {
                ChargerLocation::Node(n) => network.check_node(n)?,
                ChargerLocation::Coord(p) => network.snap_to_node(p)?,
            };
            let charger = Charger {
                id: spec.id,
                node,
                power_kw: spec.power_kw,
                plugs: spec.plugs,
                plugged: Mutex::new(Vec::with_capacity(spec.plugs as usize)),
            };
            if chargers.insert(spec.id, charger).is_some() {
                return Err(EvError::DuplicateCharger(spec.id));
            }
        }
        tracing::debug!(chargers = chargers.len(), "charging infrastructure built");
        Ok(Self { chargers })
    }

    pub fn get(&self, id: ChargerId) -> EvResult<&Charger> {
        self.chargers.get(&id).ok_or(EvError::ChargerNotFound(id))
    }

    pub fn occupy(&self, id: ChargerId, vehicle: VehicleId) -> EvResult<()> {
        self.get(id)?.occupy(vehicle)
    }

    pub fn release(&self, id: ChargerId, vehicle: VehicleId) -> EvResult<bool> {
        Ok(self.get(id)?.release(vehicle))
    }

    pub fn occupancy(&self, id: ChargerId) -> EvResult<Vec<VehicleId>> {
        Ok(self.get(id)?.occupancy())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Charger> {
        self.chargers.values()
    }

    pub fn len(&self) -> usize {
        self.chargers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chargers.is_empty()
    }
}
