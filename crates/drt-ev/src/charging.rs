//! Power-limited charging maths.
//!
//! # Model
//!
//! A charger rated `P` kW can push at most `P / C` C into a battery of
//! capacity `C` kWh.  The effective rate at relative SoC `s` is therefore
//!
//! ```text
//! r(s) = min(curve(s), P / C)
//! ```
//!
//! which is again piecewise linear: each curve segment that crosses the limit
//! is split at the crossing, and the part above the limit becomes flat.  For
//! the calibrated curve shapes this is the same as sliding breakpoints along
//! their segments to the rated-power level.
//!
//! # Time integration
//!
//! Charging from `s0` to `s1` inside one piece takes
//!
//! ```text
//! t = 3600 · (s1 − s0) / ((r(s0) + r(s1)) / 2)      seconds
//! ```
//!
//! (trapezoidal rule on the inverse rate).  [`PowerLimitedCurve::advance`] is
//! the closed-form inverse of the same sum, so charging for
//! `remaining_charge_time` lands exactly on full.

use crate::{Battery, ChargingCurve};

/// Seconds per hour, i.e. the time one C takes to fill a battery.
const SECS_PER_C: f64 = 3_600.0;
const EPS: f64 = 1e-12;

#[derive(Copy, Clone, Debug, PartialEq)]
struct Piece {
    s0: f64,
    r0: f64,
    s1: f64,
    r1: f64,
}

impl Piece {
    #[inline]
    fn rate_at(&self, s: f64) -> f64 {
        if self.s1 - self.s0 <= EPS {
            return self.r1;
        }
        self.r0 + (self.r1 - self.r0) * (s - self.s0) / (self.s1 - self.s0)
    }

    #[inline]
    fn slope(&self) -> f64 {
        (self.r1 - self.r0) / (self.s1 - self.s0)
    }
}

/// Trapezoidal charging time between two SoC values with the given rates.
#[inline]
fn trapezoid_secs(ds: f64, ra: f64, rb: f64) -> f64 {
    if ds <= 0.0 {
        return 0.0;
    }
    2.0 * SECS_PER_C * ds / (ra + rb)
}

/// A charging curve clipped at a charger's rated power.
#[derive(Clone, Debug)]
pub struct PowerLimitedCurve {
    pieces: Vec<Piece>,
    capacity_kwh: f64,
}

impl PowerLimitedCurve {
    /// Clip `curve` for a battery of `capacity_kwh` on a `rated_kw` charger.
    pub fn new(curve: &ChargingCurve, capacity_kwh: f64, rated_kw: f64) -> Self {
        let limit = rated_kw / capacity_kwh;
        let mut pieces = Vec::with_capacity(6);

        for w in curve.points().windows(2) {
            let (a, b) = (w[0], w[1]);
            if b.soc - a.soc <= EPS {
                continue;
            }
            let crosses = (a.rate - limit) * (b.rate - limit) < 0.0;
            if crosses {
                let s_x = a.soc + (limit - a.rate) * (b.soc - a.soc) / (b.rate - a.rate);
                pieces.push(Piece { s0: a.soc, r0: a.rate.min(limit), s1: s_x, r1: limit });
                pieces.push(Piece { s0: s_x, r0: limit, s1: b.soc, r1: b.rate.min(limit) });
            } else {
                pieces.push(Piece {
                    s0: a.soc,
                    r0: a.rate.min(limit),
                    s1: b.soc,
                    r1: b.rate.min(limit),
                });
            }
        }

        Self { pieces, capacity_kwh }
    }

    /// Effective rate in C at relative SoC `s`.
    pub fn rate_at(&self, s: f64) -> f64 {
        let s = s.clamp(0.0, 1.0);
        self.pieces
            .iter()
            .find(|p| s <= p.s1)
            .or(self.pieces.last())
            .map_or(0.0, |p| p.rate_at(s))
    }

    /// Effective power in kW at relative SoC `s`.
    pub fn power_at(&self, s: f64) -> f64 {
        self.rate_at(s) * self.capacity_kwh
    }

    /// Seconds to charge from relative SoC `from` to `to` (0 if `to <= from`).
    pub fn time_between(&self, from: f64, to: f64) -> f64 {
        let from = from.clamp(0.0, 1.0);
        let to = to.clamp(0.0, 1.0);
        if to <= from {
            return 0.0;
        }
        let mut total = 0.0;
        for p in &self.pieces {
            if p.s1 <= from || p.s0 >= to {
                continue;
            }
            let a = from.max(p.s0);
            let b = to.min(p.s1);
            total += trapezoid_secs(b - a, p.rate_at(a), p.rate_at(b));
        }
        total
    }

    /// Relative SoC reached after charging `secs` seconds from `from`.
    /// Never exceeds 1.0.
    pub fn advance(&self, from: f64, secs: f64) -> f64 {
        let mut s = from.clamp(0.0, 1.0);
        let mut left = secs.max(0.0);

        for p in &self.pieces {
            if p.s1 <= s {
                continue;
            }
            if left <= 0.0 {
                break;
            }
            let a = s.max(p.s0);
            let ra = p.rate_at(a);
            let full = trapezoid_secs(p.s1 - a, ra, p.r1);
            if left + 1e-6 >= full {
                left -= full;
                s = p.s1;
                continue;
            }
            // Partial piece: t = 7200·d / (2·ra + k·d) solved for d.
            let k = p.slope();
            let d = 2.0 * ra * left / (2.0 * SECS_PER_C - left * k);
            s = (a + d).min(p.s1);
            left = 0.0;
        }

        s.min(1.0)
    }
}

// ── Free functions ────────────────────────────────────────────────────────────

/// Power in kW the battery draws on a `rated_kw` charger at its current SoC.
pub fn charging_power(battery: &Battery, curve: &ChargingCurve, rated_kw: f64) -> f64 {
    PowerLimitedCurve::new(curve, battery.capacity_kwh(), rated_kw).power_at(battery.relative_soc())
}

/// Seconds to charge the battery to full on a `rated_kw` charger.
pub fn remaining_charge_time(battery: &Battery, curve: &ChargingCurve, rated_kw: f64) -> f64 {
    charge_time(battery, curve, rated_kw, 1.0)
}

/// Seconds to charge the battery up to relative SoC `target`.
pub fn charge_time(battery: &Battery, curve: &ChargingCurve, rated_kw: f64, target: f64) -> f64 {
    PowerLimitedCurve::new(curve, battery.capacity_kwh(), rated_kw)
        .time_between(battery.relative_soc(), target)
}

/// Relative SoC after charging for `secs` seconds.
pub fn soc_after_charging(battery: &Battery, curve: &ChargingCurve, rated_kw: f64, secs: f64) -> f64 {
    PowerLimitedCurve::new(curve, battery.capacity_kwh(), rated_kw)
        .advance(battery.relative_soc(), secs)
}
