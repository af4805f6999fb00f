//! Trip request types.

use std::fmt;

use drt_core::{NodeId, PassengerId, RequestId, SimTime};

/// Inclusive pickup time window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PickupWindow {
    pub earliest: SimTime,
    pub latest: SimTime,
}

impl PickupWindow {
    pub fn new(earliest: SimTime, latest: SimTime) -> Self {
        Self { earliest, latest }
    }

    #[inline]
    pub fn contains(&self, t: SimTime) -> bool {
        self.earliest <= t && t <= self.latest
    }
}

/// A passenger's request to travel from `origin` to `destination`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Request {
    pub id: RequestId,
    pub passenger: PassengerId,
    pub origin: NodeId,
    pub destination: NodeId,
    pub submitted: SimTime,
    /// `None` = pick up as soon as possible.
    pub window: Option<PickupWindow>,
}

impl Request {
    pub fn new(
        id: RequestId,
        passenger: PassengerId,
        origin: NodeId,
        destination: NodeId,
        submitted: SimTime,
    ) -> Self {
        Self { id, passenger, origin, destination, submitted, window: None }
    }

    pub fn with_window(mut self, earliest: SimTime, latest: SimTime) -> Self {
        self.window = Some(PickupWindow::new(earliest, latest));
        self
    }

    /// Latest acceptable pickup, if bounded.
    pub fn latest_pickup(&self) -> Option<SimTime> {
        self.window.map(|w| w.latest)
    }
}

/// Why a request was cancelled.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CancelReason {
    /// Unplanned for longer than the configured expiry.
    Expired,
    /// The pickup window closed before any vehicle could be assigned.
    WindowClosed,
    /// Withdrawn by the passenger or the operator.
    Withdrawn(String),
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Expired => f.write_str("expired"),
            CancelReason::WindowClosed => f.write_str("pickup window closed"),
            CancelReason::Withdrawn(why) => write!(f, "withdrawn: {why}"),
        }
    }
}

/// Lifecycle status of a request.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RequestStatus {
    Unplanned,
    Planned,
    Performed,
    Cancelled(CancelReason),
}

impl RequestStatus {
    /// `Performed` or `Cancelled`.
    pub fn is_final(&self) -> bool {
        matches!(self, RequestStatus::Performed | RequestStatus::Cancelled(_))
    }
}
