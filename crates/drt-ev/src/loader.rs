//! CSV charger loader.
//!
//! # CSV format
//!
//! ```csv
//! charger_id,node,lat,lon,power_kw,plugs
//! 0,12,,,22.0,2
//! 1,,52.5163,13.3777,150.0,4
//! ```
//!
//! Either `node` or both `lat` and `lon` must be given.  A node wins when
//! both are present.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use drt_core::{ChargerId, GeoPoint, NodeId};

use crate::{ChargerLocation, ChargerSpec, EvError, EvResult};

#[derive(Deserialize)]
struct ChargerRecord {
    charger_id: u32,
    node:       Option<u32>,
    lat:        Option<f32>,
    lon:        Option<f32>,
    power_kw:   f64,
    plugs:      u32,
}

/// Load charger specifications from a CSV file.
pub fn load_chargers_csv(path: &Path) -> EvResult<Vec<ChargerSpec>> {
    let file = std::fs::File::open(path)?;
    load_chargers_reader(file)
}

/// Like [`load_chargers_csv`] but accepts any `Read` source.
pub fn load_chargers_reader<R: Read>(reader: R) -> EvResult<Vec<ChargerSpec>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut specs = Vec::new();

    for result in csv_reader.deserialize::<ChargerRecord>() {
        let row = result.map_err(|e| EvError::Parse(e.to_string()))?;
        let location = match (row.node, row.lat, row.lon) {
            (Some(n), _, _) => ChargerLocation::Node(NodeId(n)),
            (None, Some(lat), Some(lon)) => ChargerLocation::Coord(GeoPoint::new(lat, lon)),
            _ => {
                return Err(EvError::Parse(format!(
                    "charger {}: neither node nor lat/lon given",
                    row.charger_id
                )));
            }
        };
        specs.push(ChargerSpec {
            id: ChargerId(row.charger_id),
            location,
            power_kw: row.power_kw,
            plugs: row.plugs,
        });
    }

    Ok(specs)
}
