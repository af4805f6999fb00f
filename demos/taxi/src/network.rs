//! Synthetic grid road network for the taxi demo.

use drt_core::{GeoPoint, NodeId};
use drt_spatial::{RoadNetwork, RoadNetworkBuilder};

/// Grid side length in nodes.
pub const SIDE: u32 = 6;

/// ~500 m between neighbouring nodes.
const SPACING_DEG: f32 = 0.0045;

/// ~36 km/h urban speed.
const SPEED_MPS: f32 = 10.0;

/// Build a `SIDE × SIDE` grid of two-way roads around a downtown origin.
/// Node `r * SIDE + c` sits in row `r`, column `c`.
pub fn build_grid() -> RoadNetwork {
    let mut b = RoadNetworkBuilder::with_capacity((SIDE * SIDE) as usize, (4 * SIDE * (SIDE - 1)) as usize);
    for r in 0..SIDE {
        for c in 0..SIDE {
            b.add_node(GeoPoint::new(30.69 + r as f32 * SPACING_DEG, -88.05 + c as f32 * SPACING_DEG));
        }
    }
    for r in 0..SIDE {
        for c in 0..SIDE {
            let here = node(r, c);
            if c + 1 < SIDE {
                b.add_road_at_speed(here, node(r, c + 1), SPEED_MPS);
            }
            if r + 1 < SIDE {
                b.add_road_at_speed(here, node(r + 1, c), SPEED_MPS);
            }
        }
    }
    b.build()
}

pub fn node(row: u32, col: u32) -> NodeId {
    NodeId(row * SIDE + col)
}
