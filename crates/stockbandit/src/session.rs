//! # Bandit session
//!
//! Drives one policy over a list of symbols, one round at a time: choose an
//! arm, fetch its reward from the [`RewardSource`], feed the reward back.
//! A round is never interleaved with another; [`Session::step`] takes
//! `&mut self`.
//!
//! A failed or non-finite reward never reaches the policy. Depending on
//! [`RewardFailure`] the round either substitutes a uniform ±1 fallback or is
//! dropped with no state change.

use rand::Rng;
use rand::RngExt;
use serde::Serialize;

use crate::error::BanditError;
use crate::policy::{ArmStatistics, ArmStats, Policy};
use crate::reward::RewardSource;

/// What a round does when its reward is unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RewardFailure {
    /// Substitute a reward drawn uniformly from `[-1, 1)`.
    #[default]
    Fallback,
    /// Abandon the round without updating anything.
    Skip,
}

impl std::fmt::Display for RewardFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RewardFailure::Fallback => write!(f, "fallback"),
            RewardFailure::Skip => write!(f, "skip"),
        }
    }
}

impl std::str::FromStr for RewardFailure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fallback" => Ok(RewardFailure::Fallback),
            "skip" => Ok(RewardFailure::Skip),
            other => Err(format!("unknown reward failure mode: {other}")),
        }
    }
}

/// Uniform on `[-1, 1)`.
pub fn fallback_reward(rng: &mut impl Rng) -> f64 {
    (rng.random::<f64>() - 0.5) * 2.0
}

/// One completed round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundRecord {
    pub step: usize,
    pub arm: usize,
    pub symbol: String,
    pub reward: f64,
    pub cumulative_reward: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<f64>,
    /// The reward was substituted after a source failure.
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArmSummary {
    pub symbol: String,
    #[serde(flatten)]
    pub stats: ArmStats,
    pub average_reward: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestArm {
    pub arm: usize,
    pub symbol: String,
    pub average_reward: f64,
}

/// End-of-session report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub policy: String,
    pub rounds: usize,
    pub skipped: usize,
    pub fallbacks: usize,
    pub cumulative_reward: f64,
    pub arms: Vec<ArmSummary>,
    /// Highest average among played arms; `None` before any round completes.
    pub best: Option<BestArm>,
}

pub struct Session<P, S> {
    policy: P,
    symbols: Vec<String>,
    source: S,
    on_failure: RewardFailure,
    tally: ArmStatistics,
    records: Vec<RoundRecord>,
    skipped: usize,
    cumulative_reward: f64,
}

impl<P: Policy, S: RewardSource> Session<P, S> {
    /// `symbols[i]` names arm `i`; there must be exactly one per arm.
    pub fn new(
        policy: P,
        symbols: Vec<String>,
        source: S,
        on_failure: RewardFailure,
    ) -> Result<Self, BanditError> {
        let arms = policy.num_arms();
        if arms == 0 {
            return Err(BanditError::NoArms);
        }
        if symbols.len() != arms {
            return Err(BanditError::SymbolCount {
                symbols: symbols.len(),
                arms,
            });
        }
        Ok(Session {
            policy,
            symbols,
            source,
            on_failure,
            tally: ArmStatistics::new(arms),
            records: Vec::new(),
            skipped: 0,
            cumulative_reward: 0.0,
        })
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn records(&self) -> &[RoundRecord] {
        &self.records
    }

    /// Per-arm plays and rewards observed by this session.
    pub fn tally(&self) -> &ArmStatistics {
        &self.tally
    }

    pub fn cumulative_reward(&self) -> f64 {
        self.cumulative_reward
    }

    /// Run one round. `Ok(None)` means the round was skipped.
    pub fn step(
        &mut self,
        context: &[f64],
        rng: &mut impl Rng,
    ) -> Result<Option<RoundRecord>, BanditError> {
        let expected = self.policy.context_dimension();
        if expected > 0 && context.len() != expected {
            return Err(BanditError::ContextDimension {
                expected,
                got: context.len(),
            });
        }

        let arm = self.policy.choose(context, rng);
        let Some(symbol) = self.symbols.get(arm) else {
            return Err(BanditError::ArmOutOfRange {
                arm,
                arms: self.symbols.len(),
            });
        };

        let fetched = match self.source.reward(symbol) {
            Ok(r) if r.is_finite() => Ok(r),
            Ok(r) => Err(anyhow::anyhow!("non-finite reward {r}")),
            Err(e) => Err(e),
        };
        let (reward, fallback) = match (fetched, self.on_failure) {
            (Ok(r), _) => (r, false),
            (Err(e), RewardFailure::Fallback) => {
                let r = fallback_reward(rng);
                tracing::warn!(symbol = %symbol, error = %e, reward = r, "reward unavailable, using fallback");
                (r, true)
            }
            (Err(e), RewardFailure::Skip) => {
                tracing::warn!(symbol = %symbol, error = %e, "reward unavailable, skipping round");
                self.skipped += 1;
                return Ok(None);
            }
        };

        self.policy.observe(arm, context, reward, rng);
        self.tally.record(arm, reward);
        self.cumulative_reward += reward;

        let record = RoundRecord {
            step: self.records.len() + 1,
            arm,
            symbol: symbol.clone(),
            reward,
            cumulative_reward: self.cumulative_reward,
            context: context.to_vec(),
            fallback,
        };
        tracing::debug!(
            policy = self.policy.name(),
            step = record.step,
            arm,
            symbol = %record.symbol,
            reward,
            "round complete"
        );
        self.records.push(record.clone());
        Ok(Some(record))
    }

    /// Clear history and policy state; symbols and source are kept.
    pub fn reset(&mut self, rng: &mut impl Rng) {
        self.policy.reset(rng);
        self.tally.reset();
        self.records.clear();
        self.skipped = 0;
        self.cumulative_reward = 0.0;
    }

    pub fn summary(&self) -> SessionSummary {
        let arms = self
            .symbols
            .iter()
            .zip(self.tally.all())
            .map(|(symbol, stats)| ArmSummary {
                symbol: symbol.clone(),
                stats: *stats,
                average_reward: stats.average(),
            })
            .collect();
        let best = self
            .tally
            .best_played_arm()
            .map(|(arm, average_reward)| BestArm {
                arm,
                symbol: self.symbols[arm].clone(),
                average_reward,
            });
        SessionSummary {
            policy: self.policy.name().to_string(),
            rounds: self.records.len(),
            skipped: self.skipped,
            fallbacks: self.records.iter().filter(|r| r.fallback).count(),
            cumulative_reward: self.cumulative_reward,
            arms,
            best,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{LinUcb, Ucb1};
    use crate::reward::FnRewardSource;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // ─── Construction ───────────────────────────────────────────────────

    #[test]
    fn symbol_count_must_match_arms() {
        let source = FnRewardSource(|_: &str| Ok(0.0));
        let err = Session::new(Ucb1::new(3), symbols(&["A", "B"]), source, RewardFailure::Skip);
        assert!(matches!(
            err,
            Err(BanditError::SymbolCount { symbols: 2, arms: 3 })
        ));
    }

    #[test]
    fn zero_arms_rejected() {
        let source = FnRewardSource(|_: &str| Ok(0.0));
        let err = Session::new(Ucb1::new(0), Vec::new(), source, RewardFailure::Skip);
        assert!(matches!(err, Err(BanditError::NoArms)));
    }

    #[test]
    fn contextual_policy_checks_width() {
        let source = FnRewardSource(|_: &str| Ok(1.0));
        let mut session =
            Session::new(LinUcb::new(2, 2, 1.0), symbols(&["A", "B"]), source, RewardFailure::Skip)
                .unwrap();
        let mut rng = seeded_rng();
        assert!(matches!(
            session.step(&[1.0, 2.0, 3.0], &mut rng),
            Err(BanditError::ContextDimension { expected: 2, got: 3 })
        ));
        assert!(session.step(&[1.0, 0.0], &mut rng).unwrap().is_some());
    }

    // ─── Rounds ─────────────────────────────────────────────────────────

    #[test]
    fn rounds_accumulate_reward() {
        let source = FnRewardSource(|s: &str| Ok(if s == "B" { 2.0 } else { 1.0 }));
        let mut session =
            Session::new(Ucb1::new(2), symbols(&["A", "B"]), source, RewardFailure::Fallback)
                .unwrap();
        let mut rng = seeded_rng();
        let first = session.step(&[], &mut rng).unwrap().unwrap();
        let second = session.step(&[], &mut rng).unwrap().unwrap();
        assert_eq!((first.arm, first.symbol.as_str()), (0, "A"));
        assert_eq!((second.arm, second.step), (1, 2));
        assert_eq!(second.cumulative_reward, 3.0);

        let summary = session.summary();
        assert_eq!(summary.rounds, 2);
        assert_eq!(summary.best.unwrap().symbol, "B");
    }

    #[test]
    fn skip_leaves_state_untouched() {
        let source = FnRewardSource(|_: &str| -> anyhow::Result<f64> { anyhow::bail!("offline") });
        let mut session =
            Session::new(Ucb1::new(2), symbols(&["A", "B"]), source, RewardFailure::Skip).unwrap();
        let mut rng = seeded_rng();
        assert_eq!(session.step(&[], &mut rng).unwrap(), None);
        assert_eq!(session.policy().stats().total_plays(), 0);
        assert_eq!(session.tally().total_plays(), 0);

        let summary = session.summary();
        assert_eq!((summary.rounds, summary.skipped), (0, 1));
        assert!(summary.best.is_none());
    }

    #[test]
    fn fallback_substitutes_bounded_reward() {
        let source = FnRewardSource(|_: &str| Ok(f64::NAN));
        let mut session =
            Session::new(Ucb1::new(2), symbols(&["A", "B"]), source, RewardFailure::Fallback)
                .unwrap();
        let mut rng = seeded_rng();
        for _ in 0..20 {
            let record = session.step(&[], &mut rng).unwrap().unwrap();
            assert!(record.fallback);
            assert!((-1.0..1.0).contains(&record.reward));
        }
        assert_eq!(session.summary().fallbacks, 20);
        assert!(session.cumulative_reward().is_finite());
    }

    #[test]
    fn reset_clears_history() {
        let source = FnRewardSource(|_: &str| Ok(0.3));
        let mut session =
            Session::new(Ucb1::new(1), symbols(&["A"]), source, RewardFailure::Skip).unwrap();
        let mut rng = seeded_rng();
        session.step(&[], &mut rng).unwrap();
        session.reset(&mut rng);
        assert!(session.records().is_empty());
        assert_eq!(session.cumulative_reward(), 0.0);
        assert_eq!(session.policy().stats().total_plays(), 0);
    }

    #[test]
    fn reward_failure_parses() {
        assert_eq!("skip".parse::<RewardFailure>(), Ok(RewardFailure::Skip));
        assert_eq!(RewardFailure::Fallback.to_string(), "fallback");
        assert!("retry".parse::<RewardFailure>().is_err());
    }
}
