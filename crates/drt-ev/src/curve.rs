//! Charging-power curves.
//!
//! A curve is four calibration points `A, B, C, D` of (relative state of
//! charge, relative rate in C).  Between points the rate is linear, so the
//! curve has three segments: a ramp-up `A–B`, a plateau `B–C` and a taper
//! `C–D`.  Curves are immutable and shared through `Arc` by every vehicle of
//! the same model.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{EvError, EvResult};

/// One calibration point of a [`ChargingCurve`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurvePoint {
    /// Relative state of charge in `[0, 1]`.
    pub soc: f64,
    /// Charging rate in C.
    pub rate: f64,
}

impl CurvePoint {
    pub const fn new(soc: f64, rate: f64) -> Self {
        Self { soc, rate }
    }
}

/// A validated four-point charging curve.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChargingCurve {
    name: String,
    points: [CurvePoint; 4],
}

impl ChargingCurve {
    /// Validate and build a curve.
    ///
    /// Requirements: the first point sits at SoC 0 and the last at SoC 1,
    /// SoC is non-decreasing, the first and last rates are strictly
    /// positive, rates are never negative, and no segment has zero rate at
    /// both ends (it could never be charged through).
    pub fn new(name: impl Into<String>, points: [CurvePoint; 4]) -> EvResult<Self> {
        let name = name.into();
        let bad = |msg: String| Err(EvError::InvalidCurve(format!("{name}: {msg}")));

        if points.iter().any(|p| !p.soc.is_finite() || !p.rate.is_finite()) {
            return bad("non-finite calibration point".into());
        }
        if points[0].soc != 0.0 || points[3].soc != 1.0 {
            return bad(format!(
                "curve must span SoC 0..1, got {}..{}",
                points[0].soc, points[3].soc
            ));
        }
        if points.windows(2).any(|w| w[1].soc < w[0].soc) {
            return bad("SoC of calibration points must be non-decreasing".into());
        }
        if points.iter().any(|p| p.rate < 0.0) {
            return bad("negative charging rate".into());
        }
        if points[0].rate <= 0.0 || points[3].rate <= 0.0 {
            return bad("first and last rates must be positive".into());
        }
        if points.windows(2).any(|w| w[0].rate == 0.0 && w[1].rate == 0.0 && w[1].soc > w[0].soc) {
            return bad("a segment with zero rate at both ends can never be charged through".into());
        }
        Ok(Self { name, points })
    }

    /// Tesla-style curve: fast ramp to 1.5 C, plateau to 50 %, long taper.
    pub fn tesla() -> Self {
        Self {
            name: "tesla".into(),
            points: [
                CurvePoint::new(0.0, 0.75),
                CurvePoint::new(0.15, 1.5),
                CurvePoint::new(0.5, 1.5),
                CurvePoint::new(1.0, 0.05),
            ],
        }
    }

    /// Nissan-Leaf-style curve: plateau at 1.75 C from 10 % to 60 %.
    pub fn nissan_leaf() -> Self {
        Self {
            name: "nissan_leaf".into(),
            points: [
                CurvePoint::new(0.0, 0.75),
                CurvePoint::new(0.1, 1.75),
                CurvePoint::new(0.6, 1.75),
                CurvePoint::new(1.0, 0.05),
            ],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[CurvePoint; 4] {
        &self.points
    }

    /// Nominal rate in C at relative SoC `s` (clamped to `[0, 1]`).
    pub fn rate_at(&self, s: f64) -> f64 {
        let s = s.clamp(0.0, 1.0);
        for w in self.points.windows(2) {
            let (a, b) = (w[0], w[1]);
            if s <= b.soc {
                if b.soc <= a.soc {
                    return b.rate;
                }
                return a.rate + (b.rate - a.rate) * (s - a.soc) / (b.soc - a.soc);
            }
        }
        self.points[3].rate
    }
}

// ── CurveRegistry ─────────────────────────────────────────────────────────────

/// Curve identity → shared curve.  Seeded with the built-in presets.
#[derive(Clone, Debug)]
pub struct CurveRegistry {
    curves: BTreeMap<String, Arc<ChargingCurve>>,
}

impl CurveRegistry {
    /// A registry holding `tesla` and `nissan_leaf`.
    pub fn with_presets() -> Self {
        let mut reg = Self { curves: BTreeMap::new() };
        reg.insert(ChargingCurve::tesla());
        reg.insert(ChargingCurve::nissan_leaf());
        reg
    }

    /// Register (or replace) a curve under its own name.
    pub fn insert(&mut self, curve: ChargingCurve) -> Arc<ChargingCurve> {
        let curve = Arc::new(curve);
        self.curves.insert(curve.name().to_owned(), Arc::clone(&curve));
        curve
    }

    pub fn get(&self, name: &str) -> EvResult<Arc<ChargingCurve>> {
        self.curves
            .get(name)
            .cloned()
            .ok_or_else(|| EvError::UnknownCurve(name.to_owned()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.curves.keys().map(String::as_str)
    }
}

impl Default for CurveRegistry {
    fn default() -> Self {
        Self::with_presets()
    }
}
