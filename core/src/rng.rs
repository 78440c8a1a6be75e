//! Deterministic random number generation.
//!
//! RULE: Nothing in the experiment may call any platform RNG.
//! Every draw flows through the single ExperimentRng built from the
//! configured seed. The stream is owned, never cloned or split, so the
//! order of draws alone decides the outcome of a run.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// The one random stream of an experiment run.
pub struct ExperimentRng {
    inner: Pcg64Mcg,
}

impl ExperimentRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Sample from Normal(mean, std_dev) via Box-Muller.
    /// Consumes exactly two uniform draws per call.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        // 1 - u keeps the log argument in (0, 1].
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mean + std_dev * z
    }
}
