//! Tasks: one contiguous activity interval of a vehicle.

use drt_core::{ChargerId, NodeId, RequestId, SimTime};
use drt_spatial::Route;

use crate::{ScheduleError, ScheduleResult};

// ── TaskStatus ────────────────────────────────────────────────────────────────

/// Execution state of a task.  Moves strictly forward one step at a time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaskStatus {
    Planned,
    Started,
    Performed,
}

impl TaskStatus {
    /// The only status this one may advance to.
    pub fn next(self) -> Option<TaskStatus> {
        match self {
            TaskStatus::Planned => Some(TaskStatus::Started),
            TaskStatus::Started => Some(TaskStatus::Performed),
            TaskStatus::Performed => None,
        }
    }
}

// ── TaskKind ──────────────────────────────────────────────────────────────────

/// What the vehicle does during a task.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaskKind {
    /// Idle or waiting, optionally parked at a charger without charging.
    Stay { charger: Option<ChargerId> },
    /// Travel along a precomputed route.
    Drive { route: Route },
    /// Passenger boarding.
    Pickup { request: RequestId },
    /// Passenger alighting.
    Dropoff { request: RequestId },
    /// Plugged into a charger.
    Charge { charger: ChargerId },
}

impl TaskKind {
    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Stay { .. } => "stay",
            TaskKind::Drive { .. } => "drive",
            TaskKind::Pickup { .. } => "pickup",
            TaskKind::Dropoff { .. } => "dropoff",
            TaskKind::Charge { .. } => "charge",
        }
    }
}

// ── Task ──────────────────────────────────────────────────────────────────────

/// A task over `[begin, end)` moving the vehicle from `from` to `to`.
///
/// Only `Drive` changes location; every other kind has `from == to`.
/// Tasks built with [`with_energy`](Self::with_energy) are energy-aware and
/// carry a net battery delta in kWh (negative = consumption).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Task {
    pub kind: TaskKind,
    pub begin: SimTime,
    pub end: SimTime,
    pub from: NodeId,
    pub to: NodeId,
    status: TaskStatus,
    energy_kwh: Option<f64>,
    started_at: Option<SimTime>,
    performed_at: Option<SimTime>,
}

impl Task {
    fn new(kind: TaskKind, begin: SimTime, end: SimTime, from: NodeId, to: NodeId) -> Self {
        Self {
            kind,
            begin,
            end,
            from,
            to,
            status: TaskStatus::Planned,
            energy_kwh: None,
            started_at: None,
            performed_at: None,
        }
    }

    pub fn stay(node: NodeId, begin: SimTime, end: SimTime) -> Self {
        Self::new(TaskKind::Stay { charger: None }, begin, end, node, node)
    }

    /// A Drive spanning the route's departure and arrival.
    pub fn drive(route: Route) -> Self {
        let (begin, end, from, to) = (route.departure, route.arrival, route.from, route.to);
        Self::new(TaskKind::Drive { route }, begin, end, from, to)
    }

    pub fn pickup(request: RequestId, node: NodeId, begin: SimTime, end: SimTime) -> Self {
        Self::new(TaskKind::Pickup { request }, begin, end, node, node)
    }

    pub fn dropoff(request: RequestId, node: NodeId, begin: SimTime, end: SimTime) -> Self {
        Self::new(TaskKind::Dropoff { request }, begin, end, node, node)
    }

    pub fn charge(charger: ChargerId, node: NodeId, begin: SimTime, end: SimTime) -> Self {
        Self::new(TaskKind::Charge { charger }, begin, end, node, node)
    }

    /// Attach a net energy delta, making the task energy-aware.
    pub fn with_energy(mut self, kwh: f64) -> Self {
        self.energy_kwh = Some(kwh);
        self
    }

    #[inline]
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    #[inline]
    pub fn is_energy_aware(&self) -> bool {
        self.energy_kwh.is_some()
    }

    /// Net energy delta in kWh, `None` for tasks without energy accounting.
    #[inline]
    pub fn energy_kwh(&self) -> Option<f64> {
        self.energy_kwh
    }

    pub(crate) fn set_energy(&mut self, kwh: Option<f64>) {
        self.energy_kwh = kwh;
    }

    #[inline]
    pub fn duration_secs(&self) -> u64 {
        self.end.saturating_since(self.begin)
    }

    /// `true` if `t` lies in `[begin, end)`.
    #[inline]
    pub fn covers(&self, t: SimTime) -> bool {
        self.begin <= t && t < self.end
    }

    pub fn is_stay(&self) -> bool {
        matches!(self.kind, TaskKind::Stay { .. })
    }

    /// The request this task serves, if it is a Pickup or Dropoff.
    pub fn request(&self) -> Option<RequestId> {
        match self.kind {
            TaskKind::Pickup { request } | TaskKind::Dropoff { request } => Some(request),
            _ => None,
        }
    }

    /// The charger this task is bound to, if any.
    pub fn charger(&self) -> Option<ChargerId> {
        match self.kind {
            TaskKind::Charge { charger } => Some(charger),
            TaskKind::Stay { charger } => charger,
            _ => None,
        }
    }

    /// Where the vehicle is parked once this task is over: the charger of a
    /// Charge task, nothing for every other kind.
    pub fn docks_at(&self) -> Option<ChargerId> {
        match self.kind {
            TaskKind::Charge { charger } => Some(charger),
            _ => None,
        }
    }

    /// When execution actually started, once it has.
    pub fn started_at(&self) -> Option<SimTime> {
        self.started_at
    }

    pub fn performed_at(&self) -> Option<SimTime> {
        self.performed_at
    }

    /// Move to `new_status`, which must be the immediate successor of the
    /// current status.  `at` is the execution time, recorded for reporting.
    pub fn advance(&mut self, new_status: TaskStatus, at: SimTime) -> ScheduleResult<()> {
        if self.status.next() != Some(new_status) {
            return Err(ScheduleError::InvalidTransition { from: self.status, to: new_status });
        }
        match new_status {
            TaskStatus::Started => self.started_at = Some(at),
            TaskStatus::Performed => self.performed_at = Some(at),
            TaskStatus::Planned => {}
        }
        self.status = new_status;
        Ok(())
    }

    /// Cut the task at `t`, keeping `[begin, t)` in `self` and returning
    /// `[t, end)` as a new `Planned` task.  Energy is split pro rata.
    pub(crate) fn split_off(&mut self, t: SimTime) -> Task {
        let total = self.duration_secs();
        let mut tail = Task::new(self.kind.clone(), t, self.end, self.to, self.to);
        if let Some(e) = self.energy_kwh {
            let head_share = (t - self.begin) as f64 / total as f64;
            let head = e * head_share;
            self.energy_kwh = Some(head);
            tail.energy_kwh = Some(e - head);
        }
        self.end = t;
        tail
    }

    /// Drop `[begin, new_begin)` from the head, scaling energy with the
    /// remaining duration.
    pub(crate) fn trim_head(&mut self, new_begin: SimTime) {
        let total = self.duration_secs();
        if let Some(e) = self.energy_kwh {
            let remaining = self.end.saturating_since(new_begin);
            self.energy_kwh = Some(if total == 0 { 0.0 } else { e * remaining as f64 / total as f64 });
        }
        self.begin = new_begin;
    }
}
