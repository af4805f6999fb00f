//! CSV fleet loader.
//!
//! # CSV format
//!
//! One row per vehicle.  The energy columns are left empty for conventional
//! vehicles; for electric vehicles `battery_kwh`, `initial_soc` (fraction of
//! capacity) and `curve` are required and the consumption columns default to
//! the profile defaults.
//!
//! ```csv
//! vehicle_id,start_node,start_time,end_time,capacity,battery_kwh,initial_soc,curve,kwh_per_km,aux_kw
//! 0,4,21600,79200,4,,,,,
//! 1,9,21600,79200,4,60,0.8,tesla,0.18,1.5
//! ```
//!
//! Times are seconds since the scenario epoch.  Ids must be dense.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use drt_core::{NodeId, SimTime, VehicleId};
use drt_ev::{CurveRegistry, EnergyProfile};

use crate::{Fleet, FleetError, FleetResult, Vehicle};

#[derive(Deserialize)]
struct VehicleRecord {
    vehicle_id:  u32,
    start_node:  u32,
    start_time:  u64,
    end_time:    u64,
    capacity:    u32,
    battery_kwh: Option<f64>,
    initial_soc: Option<f64>,
    curve:       Option<String>,
    kwh_per_km:  Option<f64>,
    aux_kw:      Option<f64>,
}

/// Load a fleet from a CSV file, resolving curve names through `curves`.
pub fn load_fleet_csv(path: &Path, curves: &CurveRegistry) -> FleetResult<Fleet> {
    let file = std::fs::File::open(path)?;
    load_fleet_reader(file, curves)
}

/// Like [`load_fleet_csv`] but accepts any `Read` source.
pub fn load_fleet_reader<R: Read>(reader: R, curves: &CurveRegistry) -> FleetResult<Fleet> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut vehicles = Vec::new();

    for result in csv_reader.deserialize::<VehicleRecord>() {
        let row = result.map_err(|e| FleetError::Parse(e.to_string()))?;
        vehicles.push(build_vehicle(row, curves)?);
    }

    let fleet = Fleet::new(vehicles)?;
    tracing::info!(
        vehicles = fleet.len(),
        electric = fleet.vehicles_of(Vehicle::is_electric).len(),
        "fleet loaded"
    );
    Ok(fleet)
}

fn build_vehicle(row: VehicleRecord, curves: &CurveRegistry) -> FleetResult<Vehicle> {
    let id = VehicleId(row.vehicle_id);
    let (start, end) = (SimTime(row.start_time), SimTime(row.end_time));
    let node = NodeId(row.start_node);

    let Some(capacity_kwh) = row.battery_kwh else {
        return Vehicle::new(id, node, start, end, row.capacity);
    };

    let missing = |what: &str| FleetError::InvalidVehicle {
        id,
        reason: format!("electric vehicle without {what}"),
    };
    let soc = row.initial_soc.ok_or_else(|| missing("initial_soc"))?;
    let curve_name = row.curve.ok_or_else(|| missing("curve"))?;
    if !(0.0..=1.0).contains(&soc) {
        return Err(FleetError::InvalidVehicle {
            id,
            reason: format!("initial_soc {soc} outside [0, 1]"),
        });
    }

    let mut profile = EnergyProfile::new(capacity_kwh, curves.get(&curve_name)?);
    if let Some(k) = row.kwh_per_km {
        profile.drive_kwh_per_km = k;
    }
    if let Some(a) = row.aux_kw {
        profile.aux_kw = a;
    }
    Vehicle::electric(id, node, start, end, row.capacity, profile, soc * capacity_kwh)
}
