//! Momentum filter — trailing return over `months * 21` trading days.
//!
//! The month-to-rows conversion is a fixed approximation, not calendar aware.
//! Tickers whose history does not reach back far enough, or whose latest or
//! base close is missing, are excluded. Without a history dataset the stage
//! is a no-op.

use crate::config::MomentumParams;
use crate::domain::{CandidateSet, TRADING_DAYS_PER_MONTH};

use super::{DataNeeds, Stage, StageInputs};

#[derive(Debug, Clone)]
pub struct MomentumFilter {
    pub months: usize,
    pub min_return: f64,
}

impl MomentumFilter {
    pub fn new(months: usize, min_return: f64) -> Self {
        Self { months, min_return }
    }

    pub fn from_params(params: &MomentumParams) -> Self {
        Self::new(params.months, params.min_return)
    }

    /// Lookback in history rows. Saturates, so an absurd month count simply
    /// outruns every history.
    pub fn lookback_rows(&self) -> usize {
        self.months.saturating_mul(TRADING_DAYS_PER_MONTH)
    }
}

impl Stage for MomentumFilter {
    fn name(&self) -> &str {
        "momentum"
    }

    fn needs(&self) -> DataNeeds {
        DataNeeds::HISTORY
    }

    fn apply(&self, candidates: &CandidateSet, inputs: &StageInputs<'_>) -> CandidateSet {
        let Some(history) = inputs.history else {
            return candidates.clone();
        };
        let lookback = self.lookback_rows();
        candidates.retain_where(|row| {
            history
                .trailing_return(&row.ticker, lookback)
                .is_some_and(|ret| ret >= self.min_return)
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

    fn linear(n: usize, start: f64, end: f64) -> Vec<Option<f64>> {
        let step = (end - start) / (n - 1) as f64;
        (0..n).map(|i| Some(start + step * i as f64)).collect()
    }

    fn set(tickers: &[&str]) -> CandidateSet {
        tickers.iter().map(|t| PricedTicker::new(*t, 50.0)).collect()
    }

    #[test]
    fn lookback_uses_21_days_per_month() {
        assert_eq!(MomentumFilter::new(3, 0.0).lookback_rows(), 63);
        assert_eq!(MomentumFilter::new(12, 0.0).lookback_rows(), 252);
    }

    #[test]
    fn keeps_rising_drops_falling() {
        let history = PriceHistory::new(dates(100))
            .unwrap()
            .with_column("UP", linear(100, 50.0, 80.0))
            .unwrap()
            .with_column("DOWN", linear(100, 80.0, 50.0))
            .unwrap()
            .with_column("FLAT", vec![Some(60.0); 100])
            .unwrap();
        let out = MomentumFilter::new(3, 0.0).apply(
            &set(&["UP", "DOWN", "FLAT"]),
            &StageInputs::new(None, Some(&history)),
        );
        // FLAT has exactly 0 return: boundary is inclusive.
        assert_eq!(out.tickers(), vec!["UP", "FLAT"]);
    }

    #[test]
    fn return_measured_against_exact_lookback_row() {
        // 64 rows: lookback 63 reaches row 0.
        let mut closes = vec![Some(100.0); 64];
        closes[0] = Some(50.0);
        let history = PriceHistory::new(dates(64))
            .unwrap()
            .with_column("X", closes)
            .unwrap();
        let out = MomentumFilter::new(3, 0.99)
            .apply(&set(&["X"]), &StageInputs::new(None, Some(&history)));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn insufficient_lookback_excludes() {
        let history = PriceHistory::new(dates(63))
            .unwrap()
            .with_column("X", vec![Some(100.0); 63])
            .unwrap();
        let out = MomentumFilter::new(3, -1.0)
            .apply(&set(&["X"]), &StageInputs::new(None, Some(&history)));
        assert!(out.is_empty());
    }

    #[test]
    fn huge_month_count_excludes_instead_of_overflowing() {
        let filter = MomentumFilter::from_params(&MomentumParams {
            months: usize::MAX,
            min_return: -1.0,
        });
        assert_eq!(filter.lookback_rows(), usize::MAX);
        let history = PriceHistory::new(dates(100))
            .unwrap()
            .with_column("X", vec![Some(100.0); 100])
            .unwrap();
        let out = filter.apply(&set(&["X"]), &StageInputs::new(None, Some(&history)));
        assert!(out.is_empty());
    }

    #[test]
    fn missing_history_is_a_no_op() {
        let candidates = set(&["A"]);
        let out = MomentumFilter::new(3, 10.0).apply(&candidates, &StageInputs::default());
        assert_eq!(out, candidates);
    }
}
