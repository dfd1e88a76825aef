//! Volatility filter — gates tickers by trailing daily return volatility.
//!
//! Computes the sample standard deviation of the last `window_days` daily
//! returns, evaluated at the most recent row of the history matrix, and keeps
//! tickers at or below `max_vol`.
//!
//! Two distinct missing-data behaviours:
//! - No history dataset at all: the stage is a no-op.
//! - History present but a ticker has too few returns (or a gap in the
//!   window, or no column): that ticker is excluded.

use crate::config::VolatilityParams;
use crate::domain::CandidateSet;

use super::{DataNeeds, Stage, StageInputs};

#[derive(Debug, Clone)]
pub struct VolatilityFilter {
    pub window_days: usize,
    /// Maximum daily (not annualized) standard deviation.
    pub max_vol: f64,
}

impl VolatilityFilter {
    /// A window shorter than two returns has no sample deviation, so every
    /// ticker is excluded.
    pub fn new(window_days: usize, max_vol: f64) -> Self {
        Self {
            window_days,
            max_vol,
        }
    }

    pub fn from_params(params: &VolatilityParams) -> Self {
        Self::new(params.window_days, params.max_vol)
    }
}

impl Stage for VolatilityFilter {
    fn name(&self) -> &str {
        "volatility"
    }

    fn needs(&self) -> DataNeeds {
        DataNeeds::HISTORY
    }

    fn apply(&self, candidates: &CandidateSet, inputs: &StageInputs<'_>) -> CandidateSet {
        let Some(history) = inputs.history else {
            return candidates.clone();
        };
        candidates.retain_where(|row| {
            history
                .trailing_volatility(&row.ticker, self.window_days)
                .is_some_and(|vol| vol <= self.max_vol)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PriceHistory, PricedTicker};
    use chrono::NaiveDate;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        (0..n).map(|i| base + chrono::Duration::days(i as i64)).collect()
    }

    /// Alternating +/- `swing` returns around 100.
    fn zigzag(n: usize, swing: f64) -> Vec<Option<f64>> {
        (0..n)
            .map(|i| Some(if i % 2 == 0 { 100.0 } else { 100.0 * (1.0 + swing) }))
            .collect()
    }

    fn set(tickers: &[&str]) -> CandidateSet {
        tickers.iter().map(|t| PricedTicker::new(*t, 100.0)).collect()
    }

    #[test]
    fn keeps_calm_and_drops_wild() {
        let history = PriceHistory::new(dates(80))
            .unwrap()
            .with_column("CALM", zigzag(80, 0.005))
            .unwrap()
            .with_column("WILD", zigzag(80, 0.20))
            .unwrap();
        let out = VolatilityFilter::new(60, 0.05)
            .apply(&set(&["CALM", "WILD"]), &StageInputs::new(None, Some(&history)));
        assert_eq!(out.tickers(), vec!["CALM"]);
    }

    #[test]
    fn short_history_excludes_ticker_without_error() {
        let mut short = vec![None; 50];
        short.extend(vec![Some(100.0); 30]);
        let history = PriceHistory::new(dates(80))
            .unwrap()
            .with_column("LONG", vec![Some(100.0); 80])
            .unwrap()
            .with_column("SHORT", short)
            .unwrap();
        let out = VolatilityFilter::new(60, 0.05).apply(
            &set(&["LONG", "SHORT", "ABSENT"]),
            &StageInputs::new(None, Some(&history)),
        );
        assert_eq!(out.tickers(), vec!["LONG"]);
    }

    #[test]
    fn exactly_window_returns_is_enough() {
        // 61 closes -> 60 returns
        let history = PriceHistory::new(dates(61))
            .unwrap()
            .with_column("X", vec![Some(100.0); 61])
            .unwrap();
        let out = VolatilityFilter::new(60, 0.0)
            .apply(&set(&["X"]), &StageInputs::new(None, Some(&history)));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn missing_history_is_a_no_op() {
        let candidates = set(&["A", "B"]);
        let out = VolatilityFilter::new(60, 0.0).apply(&candidates, &StageInputs::default());
        assert_eq!(out, candidates);
    }

    #[test]
    fn window_below_two_excludes_everything() {
        let history = PriceHistory::new(dates(80))
            .unwrap()
            .with_column("FLAT", vec![Some(100.0); 80])
            .unwrap();
        for window_days in [0, 1] {
            let params = VolatilityParams {
                window_days,
                max_vol: 1.0,
            };
            let filter = VolatilityFilter::from_params(&params);
            assert_eq!(filter.window_days, window_days);
            let out = filter.apply(&set(&["FLAT"]), &StageInputs::new(None, Some(&history)));
            assert!(out.is_empty());
        }
    }

    #[test]
    fn empty_history_excludes_everything() {
        let history = PriceHistory::default();
        let out = VolatilityFilter::new(60, 1.0)
            .apply(&set(&["A"]), &StageInputs::new(None, Some(&history)));
        assert!(out.is_empty());
    }
}
