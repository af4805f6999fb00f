//! Shared error type.
//!
//! Sub-crates define their own error enums; the lookup variants here are the
//! ones every layer needs when resolving ids handed in from outside.

use thiserror::Error;

use crate::{ChargerId, NodeId, RequestId, VehicleId};

#[derive(Debug, Error)]
pub enum DrtError {
    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("request {0} not found")]
    RequestNotFound(RequestId),

    #[error("charger {0} not found")]
    ChargerNotFound(ChargerId),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `drt-core`.
pub type DrtResult<T> = Result<T, DrtError>;
