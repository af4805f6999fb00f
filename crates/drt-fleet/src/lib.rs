//! `drt-fleet`: vehicles and the fleet registry.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`vehicle`] | `Vehicle` (horizon, seats, schedule, optional battery)     |
//! | [`fleet`]   | `Fleet` (dense registry), `FleetBuilder`                  |
//! | [`loader`]  | `load_fleet_csv`, `load_fleet_reader`                     |
//! | [`error`]   | `FleetError`, `FleetResult<T>`                            |
//!
//! `VehicleId`s are dense: `fleet.get(VehicleId(i))` is an index into a
//! `Vec`, and ascending-id iteration is plain slice order.

pub mod error;
pub mod fleet;
pub mod loader;
pub mod vehicle;


pub use error::{FleetError, FleetResult};
pub use fleet::{Fleet, FleetBuilder};
pub use loader::{load_fleet_csv, load_fleet_reader};
pub use vehicle::Vehicle;
