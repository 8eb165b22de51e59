//! Seeded random number generation
//!
//! Generators are plain values owned by whoever drives generation. Nothing in
//! the crate keeps a global or static RNG.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// LCG multiplier
const LCG_A: u32 = 1_103_515_245;
/// LCG increment
const LCG_C: u32 = 12_345;
/// State is kept to 31 bits
const LCG_MASK: u32 = 0x7fff_ffff;
/// 2^31, so outputs stay strictly below 1.0
const LCG_SCALE: f64 = 2_147_483_648.0;

/// Source of uniform floats in [0, 1)
///
/// Both schedulers and the species picker draw through this trait, so the
/// canonical [`SeededRandom`] and any `rand` generator are interchangeable.
pub trait RandomSource {
    /// Next float in [0, 1)
    fn next_unit(&mut self) -> f64;

    /// Uniform float in [min, max)
    fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_unit() * (max - min)
    }

    /// Uniform index into a list of `len` items (`len` must be non-zero)
    fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "index() on an empty list");
        ((self.next_unit() * len as f64) as usize).min(len.saturating_sub(1))
    }

    /// True with probability `p`
    fn chance(&mut self, p: f64) -> bool {
        self.next_unit() < p
    }
}

/// Linear-congruential generator used for reproducible rounds and challenges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    pub fn new(seed: u32) -> Self {
        Self {
            state: seed & LCG_MASK,
        }
    }

    /// Restart the sequence from `seed`
    pub fn reseed(&mut self, seed: u32) {
        self.state = seed & LCG_MASK;
    }

    /// Current internal state (enough to resume the stream)
    pub fn state(&self) -> u32 {
        self.state
    }

    fn step(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(LCG_A).wrapping_add(LCG_C) & LCG_MASK;
        self.state
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.step() as f64 / LCG_SCALE
    }
}

impl RandomSource for Pcg32 {
    fn next_unit(&mut self) -> f64 {
        self.random::<f64>()
    }
}

/// Fresh seed from OS entropy, for rounds started without an explicit seed
pub fn entropy_seed() -> u32 {
    rand::random::<u32>() & LCG_MASK
}
