use std::collections::HashSet;

use serde::Deserialize;

use crate::error::BanditError;
use crate::policy::{EpsilonGreedy, HierarchicalThompson, LinUcb, NeuralBandit};
use crate::policy::{PolicyKind, TradingStyle, UpdateRule};
use crate::portfolio::OptimizerConfig;
use crate::session::RewardFailure;

pub const CONFIG_VERSION: u32 = 1;

pub const DEFAULT_SYMBOLS: [&str; 5] = ["AAPL", "GOOGL", "MSFT", "TSLA", "NVDA"];

// ── Raw TOML input ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigInput {
    pub version: u32,
    pub seed: Option<u64>,
    pub rounds: Option<usize>,
    pub bandit: BanditConfigInput,
    pub portfolio: PortfolioConfigInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BanditConfigInput {
    pub policy: Option<String>,
    pub style: Option<String>,
    pub symbols: Vec<String>,
    pub epsilon: Option<f64>,
    pub alpha: Option<f64>,
    pub context_dimension: Option<usize>,
    pub hidden_layers: Option<Vec<usize>>,
    pub exploration_bonus: Option<f64>,
    pub learning_rate: Option<f64>,
    pub update_rule: Option<String>,
    pub clusters: Option<usize>,
    pub on_reward_failure: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PortfolioConfigInput {
    pub stocks: Vec<String>,
    pub history_days: Option<usize>,
    pub learning_rate: Option<f64>,
    pub iterations: Option<usize>,
    pub target_return: Option<f64>,
}

// ── Resolved config ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct BanditConfig {
    pub policy: PolicyKind,
    pub style: Option<TradingStyle>,
    pub symbols: Vec<String>,
    pub epsilon: f64,
    pub alpha: f64,
    pub context_dimension: usize,
    pub hidden_layers: Vec<usize>,
    pub exploration_bonus: f64,
    pub learning_rate: f64,
    pub update_rule: UpdateRule,
    pub clusters: usize,
    pub on_reward_failure: RewardFailure,
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::EpsilonGreedy,
            style: None,
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            epsilon: EpsilonGreedy::DEFAULT_EPSILON,
            alpha: LinUcb::DEFAULT_ALPHA,
            context_dimension: 2,
            hidden_layers: NeuralBandit::DEFAULT_HIDDEN_LAYERS.to_vec(),
            exploration_bonus: NeuralBandit::DEFAULT_EXPLORATION_BONUS,
            learning_rate: NeuralBandit::DEFAULT_LEARNING_RATE,
            update_rule: UpdateRule::default(),
            clusters: HierarchicalThompson::DEFAULT_CLUSTERS,
            on_reward_failure: RewardFailure::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PortfolioConfig {
    pub stocks: Vec<String>,
    pub history_days: usize,
    pub optimizer: OptimizerConfig,
    pub target_return: Option<f64>,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            stocks: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            history_days: 252,
            optimizer: OptimizerConfig::default(),
            target_return: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub version: u32,
    pub seed: Option<u64>,
    pub rounds: usize,
    pub bandit: BanditConfig,
    pub portfolio: PortfolioConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            seed: None,
            rounds: 50,
            bandit: BanditConfig::default(),
            portfolio: PortfolioConfig::default(),
        }
    }
}

fn invalid(msg: impl Into<String>) -> BanditError {
    BanditError::InvalidConfig(msg.into())
}

/// Trim, drop empties and drop repeats (first occurrence wins).
fn dedup_symbols(symbols: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

impl BanditConfigInput {
    pub fn resolve(self) -> Result<BanditConfig, BanditError> {
        let defaults = BanditConfig::default();

        let style = self
            .style
            .as_deref()
            .map(str::parse::<TradingStyle>)
            .transpose()
            .map_err(invalid)?;
        let policy = match (&self.policy, style) {
            (Some(name), _) => name.parse::<PolicyKind>().map_err(invalid)?,
            (None, Some(style)) => style.policy(),
            (None, None) => defaults.policy,
        };
        if let Some(style) = style {
            if style.policy() != policy {
                return Err(invalid(format!(
                    "style {:?} uses {} but policy is {}",
                    style,
                    style.policy(),
                    policy
                )));
            }
        }

        let epsilon = self.epsilon.unwrap_or(defaults.epsilon);
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(invalid(format!("epsilon {epsilon} outside [0, 1]")));
        }

        let context_dimension = self.context_dimension.unwrap_or(defaults.context_dimension);
        if context_dimension == 0 {
            return Err(invalid("context_dimension must be at least 1"));
        }

        let hidden_layers = self.hidden_layers.unwrap_or(defaults.hidden_layers);
        if hidden_layers.contains(&0) {
            return Err(invalid("hidden layer widths must be at least 1"));
        }

        let clusters = self.clusters.unwrap_or(defaults.clusters);
        if clusters == 0 {
            return Err(invalid("clusters must be at least 1"));
        }

        let update_rule = self
            .update_rule
            .as_deref()
            .map(str::parse::<UpdateRule>)
            .transpose()
            .map_err(invalid)?
            .unwrap_or(defaults.update_rule);

        let on_reward_failure = self
            .on_reward_failure
            .as_deref()
            .map(str::parse::<RewardFailure>)
            .transpose()
            .map_err(invalid)?
            .unwrap_or(defaults.on_reward_failure);

        let symbols = if self.symbols.is_empty() {
            defaults.symbols
        } else {
            dedup_symbols(self.symbols)
        };
        if symbols.is_empty() {
            return Err(invalid("at least one symbol is required"));
        }

        Ok(BanditConfig {
            policy,
            style,
            symbols,
            epsilon,
            alpha: self.alpha.unwrap_or(defaults.alpha),
            context_dimension,
            hidden_layers,
            exploration_bonus: self.exploration_bonus.unwrap_or(defaults.exploration_bonus),
            learning_rate: self.learning_rate.unwrap_or(defaults.learning_rate),
            update_rule,
            clusters,
            on_reward_failure,
        })
    }
}

impl PortfolioConfigInput {
    pub fn resolve(self) -> Result<PortfolioConfig, BanditError> {
        let defaults = PortfolioConfig::default();
        let stocks = if self.stocks.is_empty() {
            defaults.stocks
        } else {
            dedup_symbols(self.stocks)
        };
        if stocks.is_empty() {
            return Err(invalid("at least one stock is required"));
        }

        let history_days = self.history_days.unwrap_or(defaults.history_days);
        if history_days < 2 {
            return Err(invalid("history_days must be at least 2"));
        }

        Ok(PortfolioConfig {
            stocks,
            history_days,
            optimizer: OptimizerConfig {
                learning_rate: self
                    .learning_rate
                    .unwrap_or(defaults.optimizer.learning_rate),
                iterations: self.iterations.unwrap_or(defaults.optimizer.iterations),
            },
            target_return: self.target_return,
        })
    }
}

impl ConfigInput {
    pub fn resolve(self) -> Result<Config, BanditError> {
        let version = if self.version == 0 {
            CONFIG_VERSION
        } else {
            self.version
        };
        if version != CONFIG_VERSION {
            return Err(invalid(format!("unsupported config version {version}")));
        }

        Ok(Config {
            version,
            seed: self.seed,
            rounds: self.rounds.unwrap_or(Config::default().rounds),
            bandit: self.bandit.resolve()?,
            portfolio: self.portfolio.resolve()?,
        })
    }
}

impl Config {
    pub fn from_toml_str(input: &str) -> Result<Self, BanditError> {
        if input.trim().is_empty() {
            return Ok(Config::default());
        }
        let parsed: ConfigInput =
            toml::from_str(input).map_err(|e| invalid(format!("invalid TOML: {e}")))?;
        parsed.resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_toml_config_basic() {
        let toml = r#"
            version = 1
            seed = 7
            rounds = 25

            [bandit]
            policy = "neural"
            symbols = ["AAPL", "MSFT", "NVDA"]
            context_dimension = 3
            hidden_layers = [32, 16]
            update_rule = "backprop"
            on_reward_failure = "skip"

            [portfolio]
            stocks = ["AAPL", "GOOGL"]
            history_days = 120
            iterations = 500
            target_return = 0.15
        "#;

        let cfg = Config::from_toml_str(toml).unwrap();
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.rounds, 25);
        assert_eq!(cfg.bandit.policy, PolicyKind::Neural);
        assert_eq!(cfg.bandit.symbols, vec!["AAPL", "MSFT", "NVDA"]);
        assert_eq!(cfg.bandit.context_dimension, 3);
        assert_eq!(cfg.bandit.hidden_layers, vec![32, 16]);
        assert_eq!(cfg.bandit.update_rule, UpdateRule::Backprop);
        assert_eq!(cfg.bandit.on_reward_failure, RewardFailure::Skip);
        assert_eq!(cfg.portfolio.stocks, vec!["AAPL", "GOOGL"]);
        assert_eq!(cfg.portfolio.history_days, 120);
        assert_eq!(cfg.portfolio.optimizer.iterations, 500);
        assert!((cfg.portfolio.optimizer.learning_rate - 0.01).abs() < f64::EPSILON);
        assert_eq!(cfg.portfolio.target_return, Some(0.15));
    }

    #[test]
    fn empty_input_yields_defaults() {
        let cfg = Config::from_toml_str("  ").unwrap();
        assert_eq!(cfg.version, CONFIG_VERSION);
        assert_eq!(cfg.bandit.policy, PolicyKind::EpsilonGreedy);
        assert_eq!(cfg.bandit.hidden_layers, vec![64, 32]);
        assert_eq!(cfg.bandit.clusters, 3);
        assert_eq!(cfg.portfolio.optimizer.iterations, 1000);
    }

    #[test]
    fn style_selects_policy() {
        let cfg = Config::from_toml_str(
            r#"
            [bandit]
            style = "long_term"
        "#,
        )
        .unwrap();
        assert_eq!(cfg.bandit.policy, PolicyKind::Ucb1);
        assert_eq!(cfg.bandit.style, Some(TradingStyle::LongTerm));
    }

    #[test]
    fn conflicting_style_and_policy_rejected() {
        let err = Config::from_toml_str(
            r#"
            [bandit]
            style = "daily_trading"
            policy = "ucb1"
        "#,
        );
        assert!(matches!(err, Err(BanditError::InvalidConfig(_))));
    }

    #[test]
    fn symbols_are_deduplicated() {
        let cfg = Config::from_toml_str(
            r#"
            [bandit]
            symbols = ["AAPL", " MSFT ", "AAPL", ""]
        "#,
        )
        .unwrap();
        assert_eq!(cfg.bandit.symbols, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn invalid_values_rejected() {
        for toml in [
            "version = 2",
            "[bandit]\nepsilon = 1.5",
            "[bandit]\ncontext_dimension = 0",
            "[bandit]\nhidden_layers = [8, 0]",
            "[bandit]\nclusters = 0",
            "[bandit]\npolicy = \"random\"",
            "[bandit]\nupdate_rule = \"adam\"",
            "[bandit]\non_reward_failure = \"retry\"",
            "[portfolio]\nhistory_days = 1",
            "rounds = \"many\"",
        ] {
            assert!(
                matches!(Config::from_toml_str(toml), Err(BanditError::InvalidConfig(_))),
                "accepted: {toml}"
            );
        }
    }
}
