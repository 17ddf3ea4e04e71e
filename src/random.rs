// SPDX-License-Identifier: AGPL-3.0-only

//! Injectable seeded source of standard-normal draws.
//!
//! Quantum excitation consumes one draw per macro-particle per sub-kick, in
//! storage order. Both radiation kernels go through this trait, so a fixed
//! seed fixes the excitation sequence whatever the degree of parallelism
//! used to apply it.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

/// A stream of N(0, 1) samples.
pub trait NormalSource: Send {
    /// Next sample.
    fn next_normal(&mut self) -> f64;

    /// Fill `out` with consecutive samples.
    ///
    /// Must produce exactly the values `out.len()` calls of
    /// [`NormalSource::next_normal`] would.
    fn fill_normal(&mut self, out: &mut [f64]) {
        for x in out.iter_mut() {
            *x = self.next_normal();
        }
    }
}

/// ChaCha8-backed normal source.
#[derive(Clone, Debug)]
pub struct SeededNormal {
    rng: ChaCha8Rng,
}

impl SeededNormal {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Non-reproducible source seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl NormalSource for SeededNormal {
    fn next_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.rng)
    }
}
