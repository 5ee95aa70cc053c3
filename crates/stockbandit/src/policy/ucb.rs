//! UCB1 with a deterministic warm-up over unplayed arms.

use super::stats::{ArmStatistics, argmax};

#[derive(Debug, Clone)]
pub struct Ucb1 {
    stats: ArmStatistics,
}

impl Ucb1 {
    pub fn new(arms: usize) -> Self {
        Ucb1 {
            stats: ArmStatistics::new(arms),
        }
    }

    /// Select using the policy's own play total.
    pub fn select_arm(&self) -> usize {
        self.select_arm_with_total(self.stats.total_plays())
    }

    /// Select with a caller-supplied play total (floored to 1).
    ///
    /// Any unplayed arm is returned first, lowest index first, before the
    /// confidence bound is consulted.
    pub fn select_arm_with_total(&self, total_plays: u64) -> usize {
        if let Some(arm) = self.stats.first_unplayed() {
            return arm;
        }
        let ln_total = (total_plays.max(1) as f64).ln();
        argmax(self.stats.all().iter().map(|a| {
            let plays = a.plays as f64;
            a.cumulative_reward / plays + (2.0 * ln_total / plays).sqrt()
        }))
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
