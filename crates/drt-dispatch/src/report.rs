//! Per-cycle dispatch outcome.

use std::fmt;

use drt_core::{ChargerId, RequestId, SimTime, VehicleId};
use drt_demand::CancelReason;

/// Why a vehicle could not take a request.
#[derive(Clone, Debug, PartialEq)]
pub enum RejectionReason {
    /// The vehicle's schedule has no idle time left before its horizon end.
    Unavailable,
    /// No path to the origin or from origin to destination.
    NoPath,
    /// The vehicle would reach the origin after the window closes.
    OutsideWindow { arrival: SimTime, latest: SimTime },
    /// The dropoff would end after the vehicle's horizon.
    BeyondHorizon { dropoff_end: SimTime, horizon_end: SimTime },
    NoSeats,
    /// The battery would run empty somewhere in the resulting schedule.
    EnergyInfeasible { min_soc_kwh: f64 },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::Unavailable => f.write_str("no idle time left"),
            RejectionReason::NoPath => f.write_str("no path"),
            RejectionReason::OutsideWindow { arrival, latest } => {
                write!(f, "arrives at {arrival}, window closes at {latest}")
            }
            RejectionReason::BeyondHorizon { dropoff_end, horizon_end } => {
                write!(f, "dropoff ends at {dropoff_end}, vehicle stops at {horizon_end}")
            }
            RejectionReason::NoSeats => f.write_str("no seats"),
            RejectionReason::EnergyInfeasible { min_soc_kwh } => {
                write!(f, "battery would reach {min_soc_kwh:.2} kWh")
            }
        }
    }
}

/// One vehicle turning down one request.
#[derive(Clone, Debug, PartialEq)]
pub struct Rejection {
    pub vehicle: VehicleId,
    pub reason: RejectionReason,
}

/// A request that stays `Unplanned` after a cycle, with every candidate's
/// reason.  An empty `rejections` list means the policy offered no
/// candidates at all.
#[derive(Clone, Debug, PartialEq)]
pub struct InfeasibleRequest {
    pub request: RequestId,
    pub rejections: Vec<Rejection>,
}

/// A request committed to a vehicle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Assignment {
    pub request: RequestId,
    pub vehicle: VehicleId,
    pub pickup_at: SimTime,
    pub dropoff_at: SimTime,
    pub cost: f64,
}

/// A charging session planned for an idle electric vehicle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChargingAssignment {
    pub vehicle: VehicleId,
    pub charger: ChargerId,
    pub begin: SimTime,
    pub end: SimTime,
    pub energy_kwh: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DispatchReport {
    pub now: SimTime,
    /// Assignments in commit order (request submission order).
    pub planned: Vec<Assignment>,
    pub unplanned: Vec<InfeasibleRequest>,
    pub cancelled: Vec<(RequestId, CancelReason)>,
    pub charging: Vec<ChargingAssignment>,
}

impl DispatchReport {
    pub fn new(now: SimTime) -> Self {
        Self { now, ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.planned.is_empty()
            && self.unplanned.is_empty()
            && self.cancelled.is_empty()
            && self.charging.is_empty()
    }

    /// Fold another report into this one, e.g. to total a whole run.
    pub fn absorb(&mut self, other: DispatchReport) {
        self.now = self.now.max(other.now);
        self.planned.extend(other.planned);
        self.unplanned.extend(other.unplanned);
        self.cancelled.extend(other.cancelled);
        self.charging.extend(other.charging);
    }
}
