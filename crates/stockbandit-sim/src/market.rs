//! Synthetic market data.
//!
//! Stands in for a live quote service: per-symbol intraday moves with a
//! fixed drift, random daily price histories for the optimizer, and a
//! sentiment/volatility context for the contextual policies. Every draw
//! comes from the caller's RNG, so a seed reproduces a whole run.

use std::collections::HashMap;

use rand::Rng;
use rand::RngExt as _;

use stockbandit::portfolio::{HistoricalData, PricePoint};
use stockbandit::reward::RewardSource;

/// Symbols offered by the stock picker.
pub const STOCK_UNIVERSE: [&str; 24] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META", "NVDA", "JPM", "V", "DIS", "NFLX", "ADBE",
    "INTC", "CSCO", "ORCL", "BAC", "WMT", "PG", "MA", "XOM", "KO", "PEP", "CVX", "MRK",
];

/// Half-width of the measurement noise added to every reward, in percent.
const REWARD_NOISE_PCT: f64 = 0.25;

/// Largest absolute daily return in a synthetic history.
const DAILY_MOVE: f64 = 0.02;

/// Intraday behaviour of one symbol, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolProfile {
    pub drift_pct: f64,
    pub volatility_pct: f64,
}

impl SymbolProfile {
    /// Drift in ±1%, volatility in [0.5%, 2.5%).
    pub fn random(rng: &mut impl Rng) -> Self {
        SymbolProfile {
            drift_pct: (rng.random::<f64>() - 0.5) * 2.0,
            volatility_pct: 0.5 + rng.random::<f64>() * 2.0,
        }
    }
}

/// [`RewardSource`] backed by random intraday moves.
///
/// A reward is the intraday percentage change (drift plus a uniform move
/// within the symbol's volatility) plus ±0.25% noise. With
/// `failure_probability` the fetch fails instead, like a timed-out quote.
pub struct SyntheticMarket<R> {
    profiles: HashMap<String, SymbolProfile>,
    failure_probability: f64,
    rng: R,
}

impl<R: Rng> SyntheticMarket<R> {
    /// Random profiles for `symbols`, drawn from `rng`, which then drives
    /// the intraday moves.
    pub fn new(symbols: &[String], mut rng: R) -> Self {
        let profiles = symbols
            .iter()
            .map(|s| (s.clone(), SymbolProfile::random(&mut rng)))
            .collect();
        SyntheticMarket {
            profiles,
            failure_probability: 0.0,
            rng,
        }
    }

    pub fn with_profiles(profiles: HashMap<String, SymbolProfile>, rng: R) -> Self {
        SyntheticMarket {
            profiles,
            failure_probability: 0.0,
            rng,
        }
    }

    pub fn with_failure_probability(mut self, p: f64) -> Self {
        self.failure_probability = p.clamp(0.0, 1.0);
        self
    }

    pub fn profile(&self, symbol: &str) -> Option<SymbolProfile> {
        self.profiles.get(symbol).copied()
    }

    /// Symbol with the highest drift, i.e. the arm a policy should settle on.
    pub fn best_symbol(&self) -> Option<&str> {
        self.profiles
            .iter()
            .max_by(|a, b| a.1.drift_pct.total_cmp(&b.1.drift_pct))
            .map(|(s, _)| s.as_str())
    }
}

impl<R: Rng> RewardSource for SyntheticMarket<R> {
    fn reward(&mut self, symbol: &str) -> anyhow::Result<f64> {
        let Some(profile) = self.profiles.get(symbol).copied() else {
            anyhow::bail!("symbol {symbol} not listed");
        };
        if self.rng.random::<f64>() < self.failure_probability {
            anyhow::bail!("quote request for {symbol} timed out");
        }
        let movement = (self.rng.random::<f64>() - 0.5) * 2.0 * profile.volatility_pct;
        let noise = (self.rng.random::<f64>() - 0.5) * 2.0 * REWARD_NOISE_PCT;
        Ok(profile.drift_pct + movement + noise)
    }
}

/// Market-wide signal fed to the contextual policies.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct MarketContext {
    /// In [-1, 1).
    pub sentiment: f64,
    /// In [-0.05, 0.05).
    pub volatility: f64,
}

impl MarketContext {
    pub fn sample(rng: &mut impl Rng) -> Self {
        MarketContext {
            sentiment: rng.random::<f64>() * 2.0 - 1.0,
            volatility: rng.random::<f64>() * 0.1 - 0.05,
        }
    }

    pub fn features(&self) -> [f64; 2] {
        [self.sentiment, self.volatility]
    }
}

/// `days` daily closes per stock, oldest first.
///
/// Each series starts in [100, 300) and moves by at most ±2% a day.
pub fn synthetic_history(stocks: &[String], days: usize, rng: &mut impl Rng) -> HistoricalData {
    stocks
        .iter()
        .map(|stock| {
            let mut price = 100.0 + rng.random::<f64>() * 200.0;
            let series = (0..days)
                .map(|day| {
                    if day > 0 {
                        price *= 1.0 + (rng.random::<f64>() - 0.5) * 2.0 * DAILY_MOVE;
                    }
                    PricePoint::new(price, format!("day-{day:03}"))
                })
                .collect();
            (stock.clone(), series)
        })
        .collect()
}
