//! `drt-core`: foundational types for the `rust_drt` dispatch core.
//!
//! Every other `drt-*` crate depends on this one.  It has no `drt-*`
//! dependencies and only `rand` and `thiserror` externally (plus optional
//! `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`ids`]     | `VehicleId`, `RequestId`, `PassengerId`, `ChargerId`, `NodeId`, `LinkId` |
//! | [`geo`]     | `GeoPoint`, haversine distance                             |
//! | [`time`]    | `SimTime`, `SimClock`, `SimConfig`                         |
//! | [`rng`]     | `SimRng` (seeded, reproducible)                            |
//! | [`error`]   | `DrtError`, `DrtResult`                                    |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{DrtError, DrtResult};
pub use geo::GeoPoint;
pub use ids::{ChargerId, LinkId, NodeId, PassengerId, RequestId, VehicleId};
pub use rng::SimRng;
pub use time::{SimClock, SimConfig, SimTime};
