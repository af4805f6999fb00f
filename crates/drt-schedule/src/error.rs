use thiserror::Error;

use drt_core::SimTime;

use crate::TaskStatus;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid insertion at index {at}: {reason}")]
    InvalidInsertion { at: usize, reason: String },

    #[error("invalid status transition {from:?} -> {to:?}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("time {0} is outside the schedule horizon")]
    OutsideHorizon(SimTime),

    #[error("empty horizon {start}..{end}")]
    InvalidHorizon { start: SimTime, end: SimTime },

    #[error("no task at index {0}")]
    NoSuchTask(usize),

    #[error("schedule invariant violated: {0}")]
    Invariant(String),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
