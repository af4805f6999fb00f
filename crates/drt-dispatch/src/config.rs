//! Dispatcher and charging planner configuration.

use crate::{CostFunction, DispatchError, DispatchResult};

/// Tunables for the request dispatcher.
///
/// ```
/// use drt_dispatch::{CostFunction, DispatchConfig};
///
/// let cfg = DispatchConfig { cost: CostFunction::DriveTime, ..Default::default() };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DispatchConfig {
    /// Boarding time in seconds.
    pub pickup_secs: u64,
    /// Alighting time in seconds.
    pub dropoff_secs: u64,
    pub cost: CostFunction,
    /// Cancel requests still unplanned this many seconds after submission.
    /// `None` keeps them pending indefinitely.
    pub expire_after_secs: Option<u64>,
    /// Cancel unplanned requests whose pickup window has already closed.
    pub cancel_after_window: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            pickup_secs: 120,
            dropoff_secs: 60,
            cost: CostFunction::PickupArrival,
            expire_after_secs: None,
            cancel_after_window: false,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> DispatchResult<()> {
        if self.pickup_secs == 0 || self.dropoff_secs == 0 {
            return Err(DispatchError::Config(format!(
                "pickup and dropoff must take at least one second (got {} s and {} s)",
                self.pickup_secs, self.dropoff_secs
            )));
        }
        Ok(())
    }
}

/// When idle electric vehicles are sent to charge, and for how long.
///
/// Both thresholds are relative state of charge in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChargingPolicy {
    /// Idle vehicles below this level are sent to a charger.
    pub min_soc: f64,
    /// Charging stops at this level (or at the vehicle's horizon end).
    pub target_soc: f64,
}

impl Default for ChargingPolicy {
    fn default() -> Self {
        Self { min_soc: 0.2, target_soc: 0.8 }
    }
}

impl ChargingPolicy {
    pub fn validate(&self) -> DispatchResult<()> {
        let ok = (0.0..=1.0).contains(&self.min_soc)
            && (0.0..=1.0).contains(&self.target_soc)
            && self.min_soc < self.target_soc;
        if !ok {
            return Err(DispatchError::Config(format!(
                "charging thresholds must satisfy 0 <= min_soc < target_soc <= 1 (got {} and {})",
                self.min_soc, self.target_soc
            )));
        }
        Ok(())
    }
}
