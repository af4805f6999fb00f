//! Spatial-subsystem error type.

use thiserror::Error;

use drt_core::NodeId;

/// Errors produced by `drt-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("network has no nodes to snap {0} to")]
    EmptyNetwork(drt_core::GeoPoint),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
