//! `drt-ev`: battery state, charging model, and charging infrastructure.
//!
//! # Crate layout
//!
//! | Module             | Contents                                                  |
//! |--------------------|-----------------------------------------------------------|
//! | [`battery`]        | `Battery` (capacity, state of charge in kWh)              |
//! | [`curve`]          | `ChargingCurve`, `CurvePoint`, presets, `CurveRegistry`   |
//! | [`charging`]       | power-limited curve; `charging_power`, charge-time maths  |
//! | [`consumption`]    | `EnergyProfile` (drive and auxiliary consumption)         |
//! | [`infrastructure`] | `ChargerSpec`, `Charger`, `ChargingInfrastructure`        |
//! | [`loader`]         | charger specification CSV loader                          |
//! | [`error`]          | `EvError`, `EvResult<T>`                                  |
//!
//! # Units
//!
//! Energy is kWh, power is kW, state of charge is either kWh (`Battery`) or a
//! relative fraction in `[0, 1]` (curve maths).  Curve rates are in C: a rate
//! of 1.0 fills an empty battery in one hour.

pub mod battery;
pub mod charging;
pub mod consumption;
pub mod curve;
pub mod error;
pub mod infrastructure;
pub mod loader;


pub use battery::Battery;
pub use charging::{
    PowerLimitedCurve, charge_time, charging_power, remaining_charge_time, soc_after_charging,
};
pub use consumption::EnergyProfile;
pub use curve::{ChargingCurve, CurvePoint, CurveRegistry};
pub use error::{EvError, EvResult};
pub use infrastructure::{Charger, ChargerLocation, ChargerSpec, ChargingInfrastructure};
pub use loader::{load_chargers_csv, load_chargers_reader};
