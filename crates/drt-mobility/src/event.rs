//! Task-boundary events.

use drt_core::{ChargerId, RequestId, SimTime, VehicleId};
use drt_schedule::TaskKind;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskPhase {
    Started,
    Ended,
}

/// What the task was about, without the route payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Activity {
    Stay,
    Drive,
    Pickup(RequestId),
    Dropoff(RequestId),
    /// `plugged` is `false` when every plug was taken and the session was
    /// forfeited.
    Charge { charger: ChargerId, plugged: bool },
}

impl Activity {
    pub(crate) fn of(kind: &TaskKind) -> Self {
        match *kind {
            TaskKind::Stay { .. } => Activity::Stay,
            TaskKind::Drive { .. } => Activity::Drive,
            TaskKind::Pickup { request } => Activity::Pickup(request),
            TaskKind::Dropoff { request } => Activity::Dropoff(request),
            TaskKind::Charge { charger } => Activity::Charge { charger, plugged: true },
        }
    }
}

/// One task starting or ending.  `at` is the scheduled boundary time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TaskEvent {
    pub vehicle: VehicleId,
    pub index: usize,
    pub phase: TaskPhase,
    pub activity: Activity,
    pub at: SimTime,
    /// Battery change applied when an energy-aware task ended.
    pub energy_kwh: Option<f64>,
}

impl TaskEvent {
    /// The request a Pickup or Dropoff serves.
    pub fn request(&self) -> Option<RequestId> {
        match self.activity {
            Activity::Pickup(r) | Activity::Dropoff(r) => Some(r),
            _ => None,
        }
    }
}
