//! # Gaussian Thompson Sampling
//!
//! Each arm's reward is modelled as `N(mean, 1/n)`: the sample mean with a
//! standard deviation that shrinks as `1/sqrt(n)`, and `N(0, 1)` before the
//! first play. This is a fixed unit-variance heuristic, not a conjugate
//! posterior; percentage returns are unbounded so a Beta model does not fit
//! them directly.

use rand::Rng;

use super::stats::{ArmStatistics, argmax};
use crate::sampling::standard_normal;

#[derive(Debug, Clone)]
pub struct GaussianThompson {
    stats: ArmStatistics,
}

impl GaussianThompson {
    pub fn new(arms: usize) -> Self {
        GaussianThompson {
            stats: ArmStatistics::new(arms),
        }
    }

    /// Draw one sample per arm and return the arm with the largest.
    pub fn select_arm(&self, rng: &mut impl Rng) -> usize {
        let samples: Vec<f64> = self
            .stats
            .all()
            .iter()
            .map(|a| {
                let std = if a.plays > 0 {
                    1.0 / (a.plays as f64).sqrt()
                } else {
                    1.0
                };
                a.average() + std * standard_normal(rng)
            })
            .collect();
        argmax(samples)
    }

    pub fn update(&mut self, arm: usize, reward: f64) {
        self.stats.record(arm, reward);
    }

    pub fn stats(&self) -> &ArmStatistics {
        &self.stats
    }

    pub fn reset(&mut self) {
        self.stats.reset();
    }
}
