//! End-to-end runs over the synthetic market.

use rand::Rng;
use rand::RngExt as _;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use stockbandit::config::Config;
use stockbandit::policy::{AnyPolicy, Resolution};
use stockbandit::portfolio::{PortfolioMetrics, PortfolioOptimizer};
use stockbandit::session::{Session, SessionSummary};

use crate::market::{MarketContext, SyntheticMarket, synthetic_history};

/// A resolved [`Config`] plus knobs that only exist in simulation.
#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    pub config: Config,
    /// Chance that a single reward fetch fails.
    pub failure_probability: f64,
}

impl From<Config> for SimConfig {
    fn from(config: Config) -> Self {
        SimConfig {
            config,
            failure_probability: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StyleReport {
    pub label: &'static str,
    pub resolution: Resolution,
    pub history_points: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BanditReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleReport>,
    /// Symbol with the highest underlying drift.
    pub market_best: Option<String>,
    pub summary: SessionSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationEntry {
    pub stock: String,
    pub weight: f64,
    pub expected_return: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioReport {
    pub history_days: usize,
    pub allocation: Vec<AllocationEntry>,
    pub metrics: PortfolioMetrics,
}

/// Play `config.rounds` rounds of the configured policy against a
/// synthetic market.
///
/// Contextual policies get a fresh [`MarketContext`] every round.
pub fn run_bandit(sim: &SimConfig, rng: &mut impl Rng) -> anyhow::Result<BanditReport> {
    let cfg = &sim.config.bandit;
    let policy = AnyPolicy::from_config(cfg, cfg.symbols.len(), rng);
    let contextual = policy.kind().is_contextual();
    let market = SyntheticMarket::new(&cfg.symbols, StdRng::seed_from_u64(rng.random()))
        .with_failure_probability(sim.failure_probability);
    let market_best = market.best_symbol().map(str::to_string);

    tracing::info!(
        policy = %policy.kind(),
        arms = cfg.symbols.len(),
        rounds = sim.config.rounds,
        "starting bandit session"
    );

    let mut session = Session::new(policy, cfg.symbols.clone(), market, cfg.on_reward_failure)?;
    for _ in 0..sim.config.rounds {
        let context = if contextual {
            let features = MarketContext::sample(rng).features();
            let mut context = vec![0.0; cfg.context_dimension];
            for (slot, value) in context.iter_mut().zip(features) {
                *slot = value;
            }
            context
        } else {
            Vec::new()
        };
        session.step(&context, rng)?;
    }

    let summary = session.summary();
    tracing::info!(
        rounds = summary.rounds,
        skipped = summary.skipped,
        cumulative_reward = summary.cumulative_reward,
        best = summary.best.as_ref().map(|b| b.symbol.as_str()).unwrap_or("-"),
        "bandit session finished"
    );

    Ok(BanditReport {
        style: cfg.style.map(|style| {
            let (resolution, history_points) = style.history_window();
            StyleReport {
                label: style.label(),
                resolution,
                history_points,
            }
        }),
        market_best,
        summary,
    })
}

/// Optimize a long-only minimum-variance portfolio over synthetic history.
pub fn run_portfolio(sim: &SimConfig, rng: &mut impl Rng) -> PortfolioReport {
    let cfg = &sim.config.portfolio;
    let data = synthetic_history(&cfg.stocks, cfg.history_days, rng);

    let mut optimizer = PortfolioOptimizer::new(cfg.stocks.clone()).with_config(cfg.optimizer);
    optimizer.calculate_expected_returns(&data);
    optimizer.calculate_covariance_matrix(&data);
    let weights = optimizer.optimize_portfolio(cfg.target_return);
    let metrics = optimizer.calculate_portfolio_metrics(&weights);

    tracing::info!(
        stocks = cfg.stocks.len(),
        expected_return = metrics.expected_return,
        volatility = metrics.volatility,
        "portfolio optimized"
    );

    let allocation = cfg
        .stocks
        .iter()
        .zip(&weights)
        .map(|(stock, weight)| AllocationEntry {
            stock: stock.clone(),
            weight: *weight,
            expected_return: optimizer.expected_return(stock),
        })
        .collect();

    PortfolioReport {
        history_days: cfg.history_days,
        allocation,
        metrics,
    }
}
