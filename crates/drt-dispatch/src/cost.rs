//! Insertion cost functions.

use drt_core::SimTime;

/// How the added cost of an insertion is measured.  Lower is better.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CostFunction {
    /// Seconds from now until the pickup begins.
    #[default]
    PickupArrival,
    /// Seconds spent driving, empty and occupied legs together.
    DriveTime,
    /// Metres driven, empty and occupied legs together.
    Distance,
}

/// The measurable parts of a proposed insertion.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CostInputs {
    pub now: SimTime,
    pub pickup_at: SimTime,
    pub drive_secs: u64,
    pub drive_m: f64,
}

impl CostFunction {
    pub fn evaluate(self, inputs: &CostInputs) -> f64 {
        match self {
            CostFunction::PickupArrival => inputs.pickup_at.saturating_since(inputs.now) as f64,
            CostFunction::DriveTime => inputs.drive_secs as f64,
            CostFunction::Distance => inputs.drive_m,
        }
    }
}
