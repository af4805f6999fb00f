//! Demand error type.

use thiserror::Error;

use drt_core::RequestId;

use crate::RequestStatus;

#[derive(Debug, Error)]
pub enum DemandError {
    #[error("request {0} already submitted")]
    DuplicateRequest(RequestId),

    #[error("request {0} not found")]
    RequestNotFound(RequestId),

    #[error("request {id} cannot become {to} from {from:?}")]
    InvalidTransition { id: RequestId, from: RequestStatus, to: &'static str },

    #[error("invalid request {id}: {reason}")]
    InvalidRequest { id: RequestId, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request parse error: {0}")]
    Parse(String),
}

pub type DemandResult<T> = Result<T, DemandError>;
