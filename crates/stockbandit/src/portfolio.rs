//! # Portfolio optimizer
//!
//! Minimum-variance allocation over a fixed stock list:
//!
//! 1. mean simple return per stock,
//! 2. population covariance between every pair of return series,
//! 3. projected gradient descent on `wᵀΣw` from equal weights, clipping
//!    negative weights (no short selling) and renormalizing after each step.
//!
//! The target return is accepted but never enters the objective; this is a
//! pure minimum-variance optimizer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::linalg::{self, Matrix};

/// One observed price. `timestamp` is opaque to the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: f64,
    pub timestamp: String,
}

impl PricePoint {
    pub fn new(price: f64, timestamp: impl Into<String>) -> Self {
        PricePoint {
            price,
            timestamp: timestamp.into(),
        }
    }
}

/// Price series per stock, oldest first.
pub type HistoricalData = HashMap<String, Vec<PricePoint>>;

/// Simple period returns `(p[i] - p[i-1]) / p[i-1]`.
pub fn simple_returns(series: &[PricePoint]) -> Vec<f64> {
    series
        .windows(2)
        .map(|w| (w[1].price - w[0].price) / w[0].price)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population covariance (divides by `n`). `None` unless both series are
/// non-empty and of equal length.
pub fn population_covariance(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }
    let (mean_a, mean_b) = (mean(a), mean(b));
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum();
    Some(sum / a.len() as f64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerConfig {
    pub learning_rate: f64,
    pub iterations: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            iterations: 1000,
        }
    }
}

/// Risk/return summary for a weight vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioMetrics {
    pub expected_return: f64,
    pub variance: f64,
    pub volatility: f64,
    /// `expected_return / volatility`, no risk-free rate. Infinite or NaN
    /// when volatility is zero.
    pub sharpe_ratio: f64,
    pub weights: Vec<f64>,
}

impl PortfolioMetrics {
    pub fn finite_sharpe(&self) -> Option<f64> {
        self.sharpe_ratio.is_finite().then_some(self.sharpe_ratio)
    }
}

#[derive(Debug, Clone)]
pub struct PortfolioOptimizer {
    stocks: Vec<String>,
    config: OptimizerConfig,
    expected_returns: HashMap<String, f64>,
    covariance: Matrix,
    optimal_weights: Vec<f64>,
}

impl PortfolioOptimizer {
    pub fn new(stocks: Vec<String>) -> Self {
        let n = stocks.len();
        PortfolioOptimizer {
            stocks,
            config: OptimizerConfig::default(),
            expected_returns: HashMap::new(),
            covariance: vec![vec![0.0; n]; n],
            optimal_weights: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn stocks(&self) -> &[String] {
        &self.stocks
    }

    pub fn expected_returns(&self) -> &HashMap<String, f64> {
        &self.expected_returns
    }

    pub fn expected_return(&self, stock: &str) -> Option<f64> {
        self.expected_returns.get(stock).copied()
    }

    pub fn covariance_matrix(&self) -> &Matrix {
        &self.covariance
    }

    pub fn optimal_weights(&self) -> &[f64] {
        &self.optimal_weights
    }

    /// Mean simple return for every stock with at least two prices.
    ///
    /// Recomputed from `data` alone: stocks with shorter histories end up
    /// with no entry, even if an earlier call gave them one.
    pub fn calculate_expected_returns(&mut self, data: &HistoricalData) {
        self.expected_returns.clear();
        for stock in &self.stocks {
            let Some(series) = data.get(stock) else {
                tracing::debug!(stock = %stock, "no price history");
                continue;
            };
            let returns = simple_returns(series);
            if returns.is_empty() {
                tracing::debug!(stock = %stock, points = series.len(), "too few prices for a return");
                continue;
            }
            self.expected_returns.insert(stock.clone(), mean(&returns));
        }
    }

    /// Population covariance between every pair of return series.
    ///
    /// Pairs with a missing, empty or length-mismatched series stay at 0.
    pub fn calculate_covariance_matrix(&mut self, data: &HistoricalData) {
        let returns: Vec<Option<Vec<f64>>> = self
            .stocks
            .iter()
            .map(|s| data.get(s).map(|series| simple_returns(series)))
            .collect();

        let n = self.stocks.len();
        self.covariance = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if let (Some(a), Some(b)) = (&returns[i], &returns[j]) {
                    if let Some(cov) = population_covariance(a, b) {
                        self.covariance[i][j] = cov;
                    }
                }
            }
        }
    }

    /// `∂(wᵀΣw)/∂w = 2Σw`.
    pub fn variance_gradient(&self, weights: &[f64]) -> Vec<f64> {
        linalg::mat_vec(&self.covariance, weights)
            .into_iter()
            .map(|g| 2.0 * g)
            .collect()
    }

    /// Minimum-variance long-only weights.
    ///
    /// `target_return` is not part of the objective.
    pub fn optimize_portfolio(&mut self, target_return: Option<f64>) -> Vec<f64> {
        if let Some(target) = target_return {
            tracing::debug!(target, "target return ignored by minimum-variance objective");
        }
        let n = self.stocks.len();
        if n == 0 {
            self.optimal_weights = Vec::new();
            return Vec::new();
        }

        let equal = vec![1.0 / n as f64; n];
        let mut weights = equal.clone();
        for _ in 0..self.config.iterations {
            let gradient = self.variance_gradient(&weights);
            for (w, g) in weights.iter_mut().zip(&gradient) {
                *w = (*w - self.config.learning_rate * g).max(0.0);
            }
            let sum: f64 = weights.iter().sum();
            if sum > 0.0 && sum.is_finite() {
                for w in &mut weights {
                    *w /= sum;
                }
            } else {
                tracing::warn!(sum, "weights collapsed, restarting from equal weights");
                weights.clone_from(&equal);
            }
        }

        self.optimal_weights = weights.clone();
        weights
    }

    /// Expected return, variance, volatility and Sharpe ratio of `weights`.
    ///
    /// A stock without an expected return contributes nothing to the return.
    pub fn calculate_portfolio_metrics(&self, weights: &[f64]) -> PortfolioMetrics {
        let expected_return = weights
            .iter()
            .zip(&self.stocks)
            .map(|(w, s)| w * self.expected_return(s).unwrap_or(0.0))
            .sum::<f64>();
        let variance = linalg::quadratic_form(weights, &self.covariance);
        let volatility = variance.sqrt();
        PortfolioMetrics {
            expected_return,
            variance,
            volatility,
            sharpe_ratio: expected_return / volatility,
            weights: weights.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(prices: &[f64]) -> Vec<PricePoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| PricePoint::new(*p, format!("t{i}")))
            .collect()
    }

    fn stocks(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // ─── Expected returns ───────────────────────────────────────────────

    #[test]
    fn expected_return_is_mean_simple_return() {
        let mut data = HistoricalData::new();
        data.insert("A".into(), series(&[100.0, 110.0, 99.0]));
        let mut opt = PortfolioOptimizer::new(stocks(&["A"]));
        opt.calculate_expected_returns(&data);
        // (0.10 + -0.10) / 2
        assert!(opt.expected_return("A").unwrap().abs() < 1e-12);
    }

    #[test]
    fn short_or_missing_history_has_no_expected_return() {
        let mut data = HistoricalData::new();
        data.insert("A".into(), series(&[100.0]));
        data.insert("B".into(), series(&[]));
        let mut opt = PortfolioOptimizer::new(stocks(&["A", "B", "C"]));
        opt.calculate_expected_returns(&data);
        assert!(opt.expected_returns().is_empty());
    }

    #[test]
    fn recalculation_drops_returns_without_usable_history() {
        let mut opt = PortfolioOptimizer::new(stocks(&["A"]));
        let mut data = HistoricalData::new();
        data.insert("A".into(), series(&[100.0, 110.0]));
        opt.calculate_expected_returns(&data);
        opt.calculate_covariance_matrix(&data);
        assert!((opt.expected_return("A").unwrap() - 0.1).abs() < 1e-12);

        data.insert("A".into(), series(&[50.0]));
        opt.calculate_expected_returns(&data);
        opt.calculate_covariance_matrix(&data);
        assert_eq!(opt.expected_return("A"), None);
        assert_eq!(opt.covariance_matrix(), &vec![vec![0.0]]);
    }

    // ─── Covariance ─────────────────────────────────────────────────────

    #[test]
    fn covariance_uses_population_denominator() {
        let mut data = HistoricalData::new();
        // Returns: +10%, -10%
        data.insert("A".into(), series(&[100.0, 110.0, 99.0]));
        let mut opt = PortfolioOptimizer::new(stocks(&["A"]));
        opt.calculate_covariance_matrix(&data);
        // mean 0, squared deviations 0.01 each, divided by n = 2
        assert!((opt.covariance_matrix()[0][0] - 0.01).abs() < 1e-12);
    }

    #[test]
    fn mismatched_lengths_leave_zero() {
        let mut data = HistoricalData::new();
        data.insert("A".into(), series(&[100.0, 101.0, 102.0]));
        data.insert("B".into(), series(&[50.0, 49.0]));
        let mut opt = PortfolioOptimizer::new(stocks(&["A", "B", "C"]));
        opt.calculate_covariance_matrix(&data);
        let cov = opt.covariance_matrix();
        assert_eq!(cov[0][1], 0.0);
        assert_eq!(cov[1][0], 0.0);
        assert_eq!(cov[2][2], 0.0);
        // B has a single return: its variance is 0 but still computed.
        assert_eq!(cov[1][1], 0.0);
        assert!(cov[0][0] > 0.0);
    }

    // ─── Optimization ───────────────────────────────────────────────────

    #[test]
    fn optimizer_shifts_weight_to_low_variance_stock() {
        let mut opt = PortfolioOptimizer::new(stocks(&["CALM", "WILD"]));
        opt.covariance = vec![vec![0.01, 0.0], vec![0.0, 0.09]];
        let w = opt.optimize_portfolio(None);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(w[0] > w[1], "low-variance stock should dominate: {w:?}");
    }

    #[test]
    fn zero_covariance_keeps_equal_weights() {
        let mut opt = PortfolioOptimizer::new(stocks(&["A", "B", "C", "D"]));
        let w = opt.optimize_portfolio(Some(0.15));
        for wi in &w {
            assert!((wi - 0.25).abs() < 1e-12);
        }
        assert_eq!(opt.optimal_weights(), w.as_slice());
    }

    #[test]
    fn huge_covariance_does_not_collapse_weights() {
        let mut opt = PortfolioOptimizer::new(stocks(&["A", "B"]));
        opt.covariance = vec![vec![1e6, 0.0], vec![0.0, 1e6]];
        let w = opt.optimize_portfolio(None);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(w.iter().all(|x| *x >= 0.0));
    }

    #[test]
    fn empty_stock_list_yields_no_weights() {
        let mut opt = PortfolioOptimizer::new(Vec::new());
        assert!(opt.optimize_portfolio(None).is_empty());
    }

    // ─── Metrics ────────────────────────────────────────────────────────

    #[test]
    fn metrics_match_hand_computation() {
        let mut opt = PortfolioOptimizer::new(stocks(&["A", "B"]));
        opt.expected_returns.insert("A".into(), 0.02);
        opt.expected_returns.insert("B".into(), 0.04);
        opt.covariance = vec![vec![0.04, 0.01], vec![0.01, 0.09]];

        let m = opt.calculate_portfolio_metrics(&[0.5, 0.5]);
        assert!((m.expected_return - 0.03).abs() < 1e-12);
        // 0.25·0.04 + 2·0.25·0.01 + 0.25·0.09 = 0.0375
        assert!((m.variance - 0.0375).abs() < 1e-12);
        assert!((m.volatility - 0.0375_f64.sqrt()).abs() < 1e-12);
        assert!((m.sharpe_ratio - 0.03 / 0.0375_f64.sqrt()).abs() < 1e-12);
        assert_eq!(m.finite_sharpe(), Some(m.sharpe_ratio));
    }

    #[test]
    fn zero_volatility_sharpe_is_not_finite() {
        let mut opt = PortfolioOptimizer::new(stocks(&["A"]));
        opt.expected_returns.insert("A".into(), 0.01);
        let m = opt.calculate_portfolio_metrics(&[1.0]);
        assert_eq!(m.volatility, 0.0);
        assert!(m.sharpe_ratio.is_infinite());
        assert_eq!(m.finite_sharpe(), None);
    }

    #[test]
    fn missing_expected_return_contributes_zero() {
        let mut opt = PortfolioOptimizer::new(stocks(&["A", "B"]));
        opt.expected_returns.insert("A".into(), 0.05);
        let m = opt.calculate_portfolio_metrics(&[0.5, 0.5]);
        assert!((m.expected_return - 0.025).abs() < 1e-12);
    }
}
