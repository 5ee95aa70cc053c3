//! Reward boundary.
//!
//! A [`RewardSource`] turns the symbol of a chosen arm into a scalar reward.
//! In production that is a market-data fetch; it may fail, and the session
//! decides what a failure means for the round.

use std::collections::HashMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Produces the reward for playing the arm bound to `symbol`.
///
/// Called once per round, synchronously.
pub trait RewardSource {
    fn reward(&mut self, symbol: &str) -> anyhow::Result<f64>;
}

impl<S: RewardSource + ?Sized> RewardSource for Box<S> {
    fn reward(&mut self, symbol: &str) -> anyhow::Result<f64> {
        (**self).reward(symbol)
    }
}

/// Adapts any `FnMut(&str) -> anyhow::Result<f64>` into a [`RewardSource`].
pub struct FnRewardSource<F>(pub F);

impl<F> RewardSource for FnRewardSource<F>
where
    F: FnMut(&str) -> anyhow::Result<f64>,
{
    fn reward(&mut self, symbol: &str) -> anyhow::Result<f64> {
        (self.0)(symbol)
    }
}

/// One intraday bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub open: f64,
    pub close: f64,
    pub timestamp: String,
}

/// Percentage return from the earliest bar's open to the latest bar's close.
///
/// Bars are oldest first. `None` for an empty slice or a non-positive open.
pub fn intraday_return(bars: &[PriceBar]) -> Option<f64> {
    let earliest = bars.first()?;
    let latest = bars.last()?;
    if earliest.open <= 0.0 || !earliest.open.is_finite() {
        return None;
    }
    Some((latest.close - earliest.open) / earliest.open * 100.0)
}

/// Rewards from a fixed table of intraday bars per symbol.
#[derive(Debug, Clone, Default)]
pub struct PriceSeriesRewardSource {
    bars: HashMap<String, Vec<PriceBar>>,
}

impl PriceSeriesRewardSource {
    pub fn new(bars: HashMap<String, Vec<PriceBar>>) -> Self {
        Self { bars }
    }

    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<PriceBar>) {
        self.bars.insert(symbol.into(), bars);
    }
}

impl RewardSource for PriceSeriesRewardSource {
    fn reward(&mut self, symbol: &str) -> anyhow::Result<f64> {
        let bars = self
            .bars
            .get(symbol)
            .with_context(|| format!("no intraday data for {symbol}"))?;
        intraday_return(bars)
            .with_context(|| format!("unusable intraday series for {symbol} ({} bars)", bars.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(open: f64, close: f64, ts: &str) -> PriceBar {
        PriceBar {
            open,
            close,
            timestamp: ts.into(),
        }
    }

    #[test]
    fn intraday_return_spans_first_open_to_last_close() {
        let bars = [bar(100.0, 101.0, "09:30"), bar(101.0, 99.0, "10:30"), bar(99.0, 102.0, "15:30")];
        let r = intraday_return(&bars).unwrap();
        assert!((r - 2.0).abs() < 1e-12);
    }

    #[test]
    fn intraday_return_rejects_degenerate_series() {
        assert_eq!(intraday_return(&[]), None);
        assert_eq!(intraday_return(&[bar(0.0, 5.0, "09:30")]), None);
    }

    #[test]
    fn price_series_source_reports_missing_symbol() {
        let mut source = PriceSeriesRewardSource::default();
        source.insert("AAPL", vec![bar(200.0, 190.0, "09:30")]);
        assert!((source.reward("AAPL").unwrap() + 5.0).abs() < 1e-12);

        let err = source.reward("MSFT").unwrap_err();
        assert!(err.to_string().contains("MSFT"));
    }

    #[test]
    fn closures_act_as_sources() {
        let mut calls = 0;
        let mut source = FnRewardSource(|symbol: &str| {
            calls += 1;
            if symbol == "BAD" {
                anyhow::bail!("upstream down");
            }
            Ok(0.5)
        });
        assert_eq!(source.reward("AAPL").unwrap(), 0.5);
        assert!(source.reward("BAD").is_err());
        drop(source);
        assert_eq!(calls, 2);
    }
}
