use drt_demand::DemandError;
use drt_dispatch::DispatchError;
use drt_ev::EvError;
use drt_fleet::FleetError;
use drt_mobility::MobilityError;
use drt_spatial::SpatialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("mobility error: {0}")]
    Mobility(#[from] MobilityError),

    #[error("demand error: {0}")]
    Demand(#[from] DemandError),

    #[error("fleet error: {0}")]
    Fleet(#[from] FleetError),

    #[error("charging infrastructure error: {0}")]
    Ev(#[from] EvError),

    #[error("network error: {0}")]
    Spatial(#[from] SpatialError),
}

pub type SimResult<T> = Result<T, SimError>;
