//! Epsilon-greedy arm selection.

use rand::Rng;
use rand::RngExt;

use super::stats::ArmStatistics;

/// Explores a uniformly random arm with probability `epsilon`, otherwise
/// exploits the best average reward seen so far.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    epsilon: f64,
    stats: ArmStatistics,
}

impl EpsilonGreedy {
    pub const DEFAULT_EPSILON: f64 = 0.1;

    pub fn new(arms: usize, epsilon: f64) -> Self {
        EpsilonGreedy {
            epsilon,
            stats: ArmStatistics::new(arms),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn select_arm(&self, rng: &mut impl Rng) -> usize {
        let explore: f64 = rng.random();
        if explore < self.epsilon {
            rng.random_range(0..self.stats.len())
        } else {
            self.stats.argmax_average()
        }
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
