//! Seeded RNG for reproducible demand generation.
//!
//! The dispatch core itself is deterministic; randomness only enters through
//! synthetic demand.  Child generators are derived by mixing an offset with
//! the 64-bit golden-ratio constant, so adding a new consumer does not shift
//! the streams of existing ones.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Simulation-level RNG.  Not shared between threads.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive an independent generator for a sub-component.
    pub fn child(&mut self, offset: u64) -> SimRng {
        let seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Exponentially distributed sample with the given mean (inverse CDF).
    pub fn exponential(&mut self, mean: f64) -> f64 {
        let u: f64 = self.0.r#gen::<f64>();
        -mean * (1.0 - u).ln()
    }
}
