//! Per-arm running counters shared by the classic bandits.

use serde::Serialize;

/// Play count and reward sum for one arm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ArmStats {
    pub plays: u64,
    pub cumulative_reward: f64,
}

impl ArmStats {
    /// Mean reward, or 0 when the arm has never been played.
    pub fn average(&self) -> f64 {
        if self.plays > 0 {
            self.cumulative_reward / self.plays as f64
        } else {
            0.0
        }
    }
}

/// Fixed-size table of [`ArmStats`], indexed by arm.
#[derive(Debug, Clone)]
pub struct ArmStatistics {
    arms: Vec<ArmStats>,
}

impl ArmStatistics {
    pub fn new(arms: usize) -> Self {
        ArmStatistics {
            arms: vec![ArmStats::default(); arms],
        }
    }

    pub fn len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }

    /// Record one reward for `arm`. Rewards are not clamped or screened.
    pub fn record(&mut self, arm: usize, reward: f64) {
        let stats = &mut self.arms[arm];
        stats.plays += 1;
        stats.cumulative_reward += reward;
    }

    pub fn all(&self) -> &[ArmStats] {
        &self.arms
    }

    pub fn plays(&self, arm: usize) -> u64 {
        self.arms[arm].plays
    }

    pub fn average(&self, arm: usize) -> f64 {
        self.arms[arm].average()
    }

    pub fn total_plays(&self) -> u64 {
        self.arms.iter().map(|a| a.plays).sum()
    }

    /// Smallest index that has never been played.
    pub fn first_unplayed(&self) -> Option<usize> {
        self.arms.iter().position(|a| a.plays == 0)
    }

    /// Index with the highest average; unplayed arms count as 0 and the
    /// lowest index wins ties.
    pub fn argmax_average(&self) -> usize {
        argmax(self.arms.iter().map(ArmStats::average))
    }

    /// Best arm among those actually played, with its average.
    ///
    /// Unplayed arms never win here, unlike [`Self::argmax_average`].
    pub fn best_played_arm(&self) -> Option<(usize, f64)> {
        self.arms
            .iter()
            .enumerate()
            .filter(|(_, a)| a.plays > 0)
            .fold(None, |best, (i, a)| {
                let avg = a.average();
                match best {
                    Some((_, best_avg)) if avg <= best_avg => best,
                    _ => Some((i, avg)),
                }
            })
    }

    pub fn reset(&mut self) {
        for stats in &mut self.arms {
            *stats = ArmStats::default();
        }
    }
}

/// Index of the maximum value, strict `>` so the first maximum wins.
///
/// Returns 0 for an empty iterator or when every value is NaN.
pub fn argmax(values: impl IntoIterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, v) in values.into_iter().enumerate() {
        if v > best_value {
            best_value = v;
            best = i;
        }
    }
    best
}
