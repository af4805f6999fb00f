use thiserror::Error;

use drt_ev::EvError;
use drt_fleet::FleetError;

#[derive(Debug, Error)]
pub enum MobilityError {
    #[error("movement store tracks {states} vehicle(s), fleet has {vehicles}")]
    StoreMismatch { states: usize, vehicles: usize },

    #[error(transparent)]
    Fleet(#[from] FleetError),

    #[error(transparent)]
    Ev(#[from] EvError),
}

pub type MobilityResult<T> = Result<T, MobilityError>;
