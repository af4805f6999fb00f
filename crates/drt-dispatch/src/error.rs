//! Dispatch error type.
//!
//! Only structural failures are errors.  A request no vehicle can serve is a
//! normal outcome and is reported through
//! [`DispatchReport`](crate::DispatchReport) instead.

use thiserror::Error;

use drt_core::{RequestId, VehicleId};
use drt_demand::DemandError;
use drt_ev::EvError;
use drt_fleet::FleetError;
use drt_schedule::ScheduleError;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// A validated candidate could not be written into the schedule.  The
    /// cycle is aborted.
    #[error("invalid insertion into vehicle {vehicle}: {source}")]
    InvalidInsertion { vehicle: VehicleId, source: ScheduleError },

    /// A planned request could not be taken back out of its vehicle's
    /// schedule.
    #[error("cannot retract request {request} from vehicle {vehicle}: {reason}")]
    CannotRetract { request: RequestId, vehicle: VehicleId, reason: String },

    #[error("invalid dispatch configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Fleet(#[from] FleetError),

    #[error(transparent)]
    Demand(#[from] DemandError),

    #[error(transparent)]
    Ev(#[from] EvError),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
