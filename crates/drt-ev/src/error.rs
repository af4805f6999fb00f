//! EV-subsystem error type.

use thiserror::Error;

use drt_core::{ChargerId, VehicleId};
use drt_spatial::SpatialError;

/// Errors produced by `drt-ev`.
#[derive(Debug, Error)]
pub enum EvError {
    #[error("invalid charging curve: {0}")]
    InvalidCurve(String),

    #[error("unknown charging curve {0:?}")]
    UnknownCurve(String),

    #[error("invalid battery: {0}")]
    InvalidBattery(String),

    #[error("invalid charger {id}: {reason}")]
    InvalidCharger { id: ChargerId, reason: String },

    #[error("charger {0} defined twice")]
    DuplicateCharger(ChargerId),

    #[error("charger {0} not found")]
    ChargerNotFound(ChargerId),

    #[error("charger {charger} has all {plugs} plug(s) occupied, {vehicle} cannot plug in")]
    ChargerAtCapacity { charger: ChargerId, vehicle: VehicleId, plugs: u32 },

    #[error("spatial error: {0}")]
    Spatial(#[from] SpatialError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type EvResult<T> = Result<T, EvError>;
