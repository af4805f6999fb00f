//! Vehicle battery state.

use crate::{EvError, EvResult};

/// Battery capacity and current state of charge, both in kWh.
///
/// The state of charge is kept in `[0, capacity]`.  Committed schedules are
/// energy-feasible, so [`apply`](Self::apply) only has to clamp when
/// execution diverges from the plan (for example a charge session that could
/// not get a plug); every clamp is logged.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Battery {
    capacity_kwh: f64,
    soc_kwh: f64,
}

impl Battery {
    pub fn new(capacity_kwh: f64, soc_kwh: f64) -> EvResult<Self> {
        if !(capacity_kwh.is_finite() && capacity_kwh > 0.0) {
            return Err(EvError::InvalidBattery(format!(
                "capacity must be positive, got {capacity_kwh} kWh"
            )));
        }
        if !(0.0..=capacity_kwh).contains(&soc_kwh) {
            return Err(EvError::InvalidBattery(format!(
                "state of charge {soc_kwh} kWh outside [0, {capacity_kwh}]"
            )));
        }
        Ok(Self { capacity_kwh, soc_kwh })
    }

    /// Battery at `fraction` of its capacity (clamped to `[0, 1]`).
    pub fn with_relative_soc(capacity_kwh: f64, fraction: f64) -> EvResult<Self> {
        Self::new(capacity_kwh, capacity_kwh * fraction.clamp(0.0, 1.0))
    }

    #[inline]
    pub fn capacity_kwh(&self) -> f64 {
        self.capacity_kwh
    }

    #[inline]
    pub fn soc_kwh(&self) -> f64 {
        self.soc_kwh
    }

    /// State of charge as a fraction of capacity.
    #[inline]
    pub fn relative_soc(&self) -> f64 {
        self.soc_kwh / self.capacity_kwh
    }

    pub fn is_full(&self) -> bool {
        self.soc_kwh >= self.capacity_kwh
    }

    /// Add `delta_kwh` (negative = consumption) and return the change that
    /// was actually applied after clamping to `[0, capacity]`.
    pub fn apply(&mut self, delta_kwh: f64) -> f64 {
        let before = self.soc_kwh;
        let raw = before + delta_kwh;
        let clamped = raw.clamp(0.0, self.capacity_kwh);
        if (raw - clamped).abs() > 1e-9 {
            tracing::warn!(
                soc_kwh = before,
                delta_kwh,
                capacity_kwh = self.capacity_kwh,
                "battery state of charge left its bounds, clamping"
            );
        }
        self.soc_kwh = clamped;
        clamped - before
    }
}
