//! Arm-selection policies.
//!
//! Every policy owns fixed-size per-arm state indexed `0..K` and is driven
//! one round at a time: [`Policy::choose`] an arm, fetch its reward, then
//! [`Policy::observe`] the outcome. The classic bandits ignore the context;
//! LinUCB and the neural bandit require one of their configured width.

pub mod epsilon;
pub mod hierarchical;
pub mod linucb;
pub mod neural;
pub mod stats;
pub mod thompson;
pub mod ucb;

use rand::Rng;

pub use epsilon::EpsilonGreedy;
pub use hierarchical::HierarchicalThompson;
pub use linucb::LinUcb;
pub use neural::{NeuralBandit, UpdateRule};
pub use stats::{ArmStatistics, ArmStats};
pub use thompson::GaussianThompson;
pub use ucb::Ucb1;

use crate::config::BanditConfig;

/// Uniform round contract over all policies.
pub trait Policy {
    /// Stable short name, matching [`PolicyKind`]'s string form.
    fn name(&self) -> &'static str;

    fn num_arms(&self) -> usize;

    /// Context width the policy reads; 0 means the context is ignored.
    fn context_dimension(&self) -> usize {
        0
    }

    fn choose(&self, context: &[f64], rng: &mut impl Rng) -> usize;

    fn observe(&mut self, arm: usize, context: &[f64], reward: f64, rng: &mut impl Rng);

    fn reset(&mut self, rng: &mut impl Rng);
}

impl Policy for EpsilonGreedy {
    fn name(&self) -> &'static str {
        "epsilon_greedy"
    }
    fn num_arms(&self) -> usize {
        self.stats().len()
    }
    fn choose(&self, _context: &[f64], rng: &mut impl Rng) -> usize {
        self.select_arm(rng)
    }
    fn observe(&mut self, arm: usize, _context: &[f64], reward: f64, _rng: &mut impl Rng) {
        self.update(arm, reward);
    }
    fn reset(&mut self, _rng: &mut impl Rng) {
        EpsilonGreedy::reset(self);
    }
}

impl Policy for Ucb1 {
    fn name(&self) -> &'static str {
        "ucb1"
    }
    fn num_arms(&self) -> usize {
        self.stats().len()
    }
    fn choose(&self, _context: &[f64], _rng: &mut impl Rng) -> usize {
        self.select_arm()
    }
    fn observe(&mut self, arm: usize, _context: &[f64], reward: f64, _rng: &mut impl Rng) {
        self.update(arm, reward);
    }
    fn reset(&mut self, _rng: &mut impl Rng) {
        Ucb1::reset(self);
    }
}

impl Policy for GaussianThompson {
    fn name(&self) -> &'static str {
        "thompson"
    }
    fn num_arms(&self) -> usize {
        self.stats().len()
    }
    fn choose(&self, _context: &[f64], rng: &mut impl Rng) -> usize {
        self.select_arm(rng)
    }
    fn observe(&mut self, arm: usize, _context: &[f64], reward: f64, _rng: &mut impl Rng) {
        self.update(arm, reward);
    }
    fn reset(&mut self, _rng: &mut impl Rng) {
        GaussianThompson::reset(self);
    }
}

impl Policy for LinUcb {
    fn name(&self) -> &'static str {
        "linucb"
    }
    fn num_arms(&self) -> usize {
        LinUcb::num_arms(self)
    }
    fn context_dimension(&self) -> usize {
        LinUcb::context_dimension(self)
    }
    fn choose(&self, context: &[f64], _rng: &mut impl Rng) -> usize {
        self.select_arm(context)
    }
    fn observe(&mut self, arm: usize, context: &[f64], reward: f64, _rng: &mut impl Rng) {
        self.update(arm, context, reward);
    }
    fn reset(&mut self, _rng: &mut impl Rng) {
        LinUcb::reset(self);
    }
}

impl Policy for NeuralBandit {
    fn name(&self) -> &'static str {
        "neural"
    }
    fn num_arms(&self) -> usize {
        NeuralBandit::num_arms(self)
    }
    fn context_dimension(&self) -> usize {
        NeuralBandit::context_dimension(self)
    }
    fn choose(&self, context: &[f64], rng: &mut impl Rng) -> usize {
        self.select_arm(context, rng)
    }
    fn observe(&mut self, arm: usize, context: &[f64], reward: f64, _rng: &mut impl Rng) {
        self.update(arm, context, reward);
    }
    fn reset(&mut self, rng: &mut impl Rng) {
        NeuralBandit::reset(self, rng);
    }
}

impl Policy for HierarchicalThompson {
    fn name(&self) -> &'static str {
        "hierarchical"
    }
    fn num_arms(&self) -> usize {
        HierarchicalThompson::num_arms(self)
    }
    fn choose(&self, _context: &[f64], rng: &mut impl Rng) -> usize {
        self.select_arm(rng)
    }
    fn observe(&mut self, arm: usize, _context: &[f64], reward: f64, rng: &mut impl Rng) {
        self.update(arm, reward, rng);
    }
    fn reset(&mut self, _rng: &mut impl Rng) {
        HierarchicalThompson::reset(self);
    }
}

// ── Policy kinds ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    EpsilonGreedy,
    Ucb1,
    Thompson,
    LinUcb,
    Neural,
    Hierarchical,
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyKind::EpsilonGreedy => write!(f, "epsilon_greedy"),
            PolicyKind::Ucb1 => write!(f, "ucb1"),
            PolicyKind::Thompson => write!(f, "thompson"),
            PolicyKind::LinUcb => write!(f, "linucb"),
            PolicyKind::Neural => write!(f, "neural"),
            PolicyKind::Hierarchical => write!(f, "hierarchical"),
        }
    }
}

impl std::str::FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "epsilon_greedy" | "epsilon" => Ok(PolicyKind::EpsilonGreedy),
            "ucb1" | "ucb" => Ok(PolicyKind::Ucb1),
            "thompson" => Ok(PolicyKind::Thompson),
            "linucb" | "contextual" => Ok(PolicyKind::LinUcb),
            "neural" => Ok(PolicyKind::Neural),
            "hierarchical" => Ok(PolicyKind::Hierarchical),
            other => Err(format!("unknown policy: {other}")),
        }
    }
}

impl PolicyKind {
    /// Whether the policy reads a context vector each round.
    pub fn is_contextual(&self) -> bool {
        matches!(self, PolicyKind::LinUcb | PolicyKind::Neural)
    }
}

// ── Trading styles ──────────────────────────────────────────────────

/// Granularity of the price history shown for a style's best pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Monthly,
    Hourly,
    Daily,
}

/// User-facing investing styles, each backed by one classic policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradingStyle {
    /// Monthly returns and long-term growth.
    LongTerm,
    /// Intraday trading and short-term gains.
    DailyTrading,
    /// Balanced exploration and exploitation.
    Conservative,
}

impl TradingStyle {
    pub fn policy(&self) -> PolicyKind {
        match self {
            TradingStyle::LongTerm => PolicyKind::Ucb1,
            TradingStyle::DailyTrading => PolicyKind::Thompson,
            TradingStyle::Conservative => PolicyKind::EpsilonGreedy,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TradingStyle::LongTerm => "Long-Term Investment",
            TradingStyle::DailyTrading => "Daily Trading",
            TradingStyle::Conservative => "Conservative Investing",
        }
    }

    /// Price-history window reviewed after a session: resolution and point count.
    pub fn history_window(&self) -> (Resolution, usize) {
        match self {
            TradingStyle::LongTerm => (Resolution::Monthly, 12),
            TradingStyle::DailyTrading => (Resolution::Hourly, 24),
            TradingStyle::Conservative => (Resolution::Daily, 7),
        }
    }
}

impl std::str::FromStr for TradingStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long_term" => Ok(TradingStyle::LongTerm),
            "daily_trading" => Ok(TradingStyle::DailyTrading),
            "conservative" => Ok(TradingStyle::Conservative),
            other => Err(format!("unknown trading style: {other}")),
        }
    }
}

// ── Dispatch ────────────────────────────────────────────────────────

/// Any policy, picked at runtime from configuration.
#[derive(Debug, Clone)]
pub enum AnyPolicy {
    EpsilonGreedy(EpsilonGreedy),
    Ucb1(Ucb1),
    Thompson(GaussianThompson),
    LinUcb(LinUcb),
    Neural(NeuralBandit),
    Hierarchical(HierarchicalThompson),
}

impl AnyPolicy {
    /// Build the configured policy with `arms` arms.
    ///
    /// The neural bandit draws its initial weights from `rng`.
    pub fn from_config(cfg: &BanditConfig, arms: usize, rng: &mut impl Rng) -> Self {
        match cfg.policy {
            PolicyKind::EpsilonGreedy => AnyPolicy::EpsilonGreedy(EpsilonGreedy::new(arms, cfg.epsilon)),
            PolicyKind::Ucb1 => AnyPolicy::Ucb1(Ucb1::new(arms)),
            PolicyKind::Thompson => AnyPolicy::Thompson(GaussianThompson::new(arms)),
            PolicyKind::LinUcb => {
                AnyPolicy::LinUcb(LinUcb::new(arms, cfg.context_dimension, cfg.alpha))
            }
            PolicyKind::Neural => AnyPolicy::Neural(
                NeuralBandit::new(arms, cfg.context_dimension, &cfg.hidden_layers, rng)
                    .with_exploration_bonus(cfg.exploration_bonus)
                    .with_learning_rate(cfg.learning_rate)
                    .with_update_rule(cfg.update_rule),
            ),
            PolicyKind::Hierarchical => {
                AnyPolicy::Hierarchical(HierarchicalThompson::new(arms, cfg.clusters))
            }
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            AnyPolicy::EpsilonGreedy(_) => PolicyKind::EpsilonGreedy,
            AnyPolicy::Ucb1(_) => PolicyKind::Ucb1,
            AnyPolicy::Thompson(_) => PolicyKind::Thompson,
            AnyPolicy::LinUcb(_) => PolicyKind::LinUcb,
            AnyPolicy::Neural(_) => PolicyKind::Neural,
            AnyPolicy::Hierarchical(_) => PolicyKind::Hierarchical,
        }
    }
}

macro_rules! dispatch {
    ($self:expr, $p:ident => $body:expr) => {
        match $self {
            AnyPolicy::EpsilonGreedy($p) => $body,
            AnyPolicy::Ucb1($p) => $body,
            AnyPolicy::Thompson($p) => $body,
            AnyPolicy::LinUcb($p) => $body,
            AnyPolicy::Neural($p) => $body,
            AnyPolicy::Hierarchical($p) => $body,
        }
    };
}

impl Policy for AnyPolicy {
    fn name(&self) -> &'static str {
        dispatch!(self, p => p.name())
    }
    fn num_arms(&self) -> usize {
        dispatch!(self, p => Policy::num_arms(p))
    }
    fn context_dimension(&self) -> usize {
        dispatch!(self, p => Policy::context_dimension(p))
    }
    fn choose(&self, context: &[f64], rng: &mut impl Rng) -> usize {
        dispatch!(self, p => p.choose(context, rng))
    }
    fn observe(&mut self, arm: usize, context: &[f64], reward: f64, rng: &mut impl Rng) {
        dispatch!(self, p => p.observe(arm, context, reward, rng))
    }
    fn reset(&mut self, rng: &mut impl Rng) {
        dispatch!(self, p => Policy::reset(p, rng))
    }
}
