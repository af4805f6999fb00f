//! Fleet error type.

use thiserror::Error;

use drt_core::VehicleId;
use drt_ev::EvError;
use drt_schedule::ScheduleError;
use drt_spatial::SpatialError;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("vehicle ids must be dense: expected {expected}, found {found}")]
    NonDenseIds { expected: VehicleId, found: VehicleId },

    #[error("invalid vehicle {id}: {reason}")]
    InvalidVehicle { id: VehicleId, reason: String },

    #[error("vehicle {id}: {source}")]
    Schedule { id: VehicleId, source: ScheduleError },

    #[error(transparent)]
    Ev(#[from] EvError),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("fleet parse error: {0}")]
    Parse(String),
}

pub type FleetResult<T> = Result<T, FleetError>;
