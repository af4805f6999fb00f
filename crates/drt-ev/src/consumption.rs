//! Vehicle energy profile and consumption model.

use std::sync::Arc;

use crate::charging::PowerLimitedCurve;
use crate::ChargingCurve;

/// Energy characteristics shared by vehicles of one model.
///
/// Consumption is linear: driving costs `drive_kwh_per_km` per kilometre and
/// every other task (idling, boarding, alighting) draws `aux_kw`.
#[derive(Clone, Debug)]
pub struct EnergyProfile {
    pub capacity_kwh: f64,
    pub curve: Arc<ChargingCurve>,
    pub drive_kwh_per_km: f64,
    pub aux_kw: f64,
}

impl EnergyProfile {
    pub fn new(capacity_kwh: f64, curve: Arc<ChargingCurve>) -> Self {
        Self { capacity_kwh, curve, drive_kwh_per_km: 0.18, aux_kw: 0.0 }
    }

    pub fn with_consumption(mut self, drive_kwh_per_km: f64, aux_kw: f64) -> Self {
        self.drive_kwh_per_km = drive_kwh_per_km;
        self.aux_kw = aux_kw;
        self
    }

    /// Energy delta (≤ 0) of driving `length_m` metres.
    #[inline]
    pub fn drive_energy(&self, length_m: f64) -> f64 {
        -(length_m / 1_000.0) * self.drive_kwh_per_km
    }

    /// Energy delta (≤ 0) of `secs` seconds of auxiliary load.
    #[inline]
    pub fn idle_energy(&self, secs: u64) -> f64 {
        -self.aux_kw * secs as f64 / 3_600.0
    }

    /// Energy gained (≥ 0) charging `secs` seconds on a `rated_kw` charger
    /// starting from `soc_kwh`.
    pub fn charge_energy(&self, soc_kwh: f64, rated_kw: f64, secs: u64) -> f64 {
        let limited = PowerLimitedCurve::new(&self.curve, self.capacity_kwh, rated_kw);
        let from = (soc_kwh / self.capacity_kwh).clamp(0.0, 1.0);
        let to = limited.advance(from, secs as f64);
        (to - from) * self.capacity_kwh
    }

    /// Whole seconds needed to charge from `soc_kwh` to relative SoC
    /// `target` on a `rated_kw` charger.
    pub fn charge_secs_to(&self, soc_kwh: f64, rated_kw: f64, target: f64) -> u64 {
        let limited = PowerLimitedCurve::new(&self.curve, self.capacity_kwh, rated_kw);
        let secs = limited.time_between((soc_kwh / self.capacity_kwh).clamp(0.0, 1.0), target);
        drt_core::SimTime::ceil_secs(secs)
    }
}
