//! # stockbandit-sim
//!
//! Runs a bandit session or a portfolio optimization against the synthetic
//! market and prints the report as JSON on stdout. Logs go to stderr.
//!
//! Flags fall back to `STOCKBANDIT_CONFIG` and `STOCKBANDIT_SEED`.
//!
//! ## Usage
//!
//! ```bash
//! # 50 rounds of epsilon-greedy over the default symbols
//! stockbandit-sim
//!
//! # LinUCB from a config file, reproducible
//! stockbandit-sim --config bandit.toml --policy linucb --seed 7
//!
//! # Minimum-variance allocation
//! stockbandit-sim --mode portfolio
//! ```

use rand::RngExt as _;
use rand::SeedableRng;
use rand::rngs::StdRng;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use stockbandit::config::Config;
use stockbandit::policy::PolicyKind;
use stockbandit_sim::scenario::{SimConfig, run_bandit, run_portfolio};

fn main() -> anyhow::Result<()> {
    // ── Logging ─────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    // ── Parse CLI ───────────────────────────────────────────────
    let args = Cli::parse();

    // ── Config ──────────────────────────────────────────────────
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {path}"))?;
            Config::from_toml_str(&text)?
        }
        None => Config::default(),
    };
    if let Some(policy) = args.policy {
        if config.bandit.style.is_some_and(|s| s.policy() != policy) {
            tracing::warn!(%policy, "--policy overrides the configured trading style");
            config.bandit.style = None;
        }
        config.bandit.policy = policy;
    }
    if let Some(rounds) = args.rounds {
        config.rounds = rounds;
    }
    let seed = args
        .seed
        .or(config.seed)
        .unwrap_or_else(|| rand::rng().random());

    tracing::info!(
        mode = ?args.mode,
        seed,
        config = args.config.as_deref().unwrap_or("<defaults>"),
        "stockbandit-sim starting"
    );

    // ── Run ─────────────────────────────────────────────────────
    let mut rng = StdRng::seed_from_u64(seed);
    let sim = SimConfig {
        config,
        failure_probability: args.failure_rate,
    };
    let report = match args.mode {
        Mode::Bandit => serde_json::to_string_pretty(&run_bandit(&sim, &mut rng)?)?,
        Mode::Portfolio => serde_json::to_string_pretty(&run_portfolio(&sim, &mut rng))?,
    };
    println!("{report}");

    Ok(())
}

// ─── CLI ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Play a bandit session against the synthetic market.
    Bandit,
    /// Optimize a minimum-variance portfolio over synthetic history.
    Portfolio,
}

/// Bandit stock selection against a synthetic market.
#[derive(Parser, Debug)]
#[command(name = "stockbandit-sim", about = "Bandit stock selection against a synthetic market")]
struct Cli {
    /// TOML config file.
    #[arg(long, short, env = "STOCKBANDIT_CONFIG")]
    config: Option<String>,

    /// What to run.
    #[arg(long, short, value_enum, default_value_t = Mode::Bandit)]
    mode: Mode,

    /// Policy override: epsilon_greedy, ucb1, thompson, linucb, neural or hierarchical.
    #[arg(long, short, value_parser = parse_policy)]
    policy: Option<PolicyKind>,

    /// Rounds per bandit session (config default: 50).
    #[arg(long = "rounds", short = 'n')]
    rounds: Option<usize>,

    /// RNG seed for a reproducible run.
    #[arg(long, short, env = "STOCKBANDIT_SEED")]
    seed: Option<u64>,

    /// Probability that a single reward fetch fails.
    #[arg(long, short, default_value_t = 0.0, value_parser = parse_failure_rate)]
    failure_rate: f64,
}

fn parse_policy(s: &str) -> Result<PolicyKind, String> {
    s.parse()
}

fn parse_failure_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s
        .parse()
        .map_err(|e| format!("invalid failure rate '{s}': {e}"))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(format!("failure rate {rate} must be within [0, 1]"));
    }
    Ok(rate)
}
