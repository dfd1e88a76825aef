//! Dividend yield floor.
//!
//! Unlike every other fundamentals stage, an absent `dividendYield` counts as
//! a yield of 0.0 rather than excluding the row. With the default
//! `min_yield = 0.0` this stage therefore keeps non-payers.

use crate::config::DividendParams;
use crate::domain::CandidateSet;

use super::{DataNeeds, Stage, StageInputs};

#[derive(Debug, Clone)]
pub struct DividendFilter {
    pub min_yield: f64,
}

impl DividendFilter {
    pub fn new(min_yield: f64) -> Self {
        Self { min_yield }
    }

    pub fn from_params(params: &DividendParams) -> Self {
        Self::new(params.min_yield)
    }
}

impl Stage for DividendFilter {
    fn name(&self) -> &str {
        "dividend"
    }

    fn needs(&self) -> DataNeeds {
        DataNeeds::FUNDAMENTALS
    }

    fn apply(&self, candidates: &CandidateSet, inputs: &StageInputs<'_>) -> CandidateSet {
        let Some(fundamentals) = inputs.fundamentals else {
            return candidates.clone();
        };
        candidates.retain_where(|row| {
            let dividend_yield = fundamentals
                .get(&row.ticker)
                .and_then(|f| f.dividend_yield)
                .unwrap_or(0.0);
            dividend_yield >= self.min_yield
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::test_support::{candidates, record, snapshot};

    #[test]
    fn absent_yield_passes_zero_floor() {
        let snap = snapshot(vec![record("A", |_| {})]);
        let out = DividendFilter::new(0.0)
            .apply(&candidates(&["A", "NOT_IN_SNAPSHOT"]), &StageInputs::new(Some(&snap), None));
        assert_eq!(out.tickers(), vec!["A", "NOT_IN_SNAPSHOT"]);
    }

    #[test]
    fn absent_yield_fails_positive_floor() {
        let snap = snapshot(vec![
            record("PAYER", |r| r.dividend_yield = Some(0.03)),
            record("EDGE", |r| r.dividend_yield = Some(0.02)),
            record("LOW", |r| r.dividend_yield = Some(0.01)),
            record("NONE", |_| {}),
        ]);
        let set = candidates(&["PAYER", "EDGE", "LOW", "NONE"]);
        let out = DividendFilter::new(0.02).apply(&set, &StageInputs::new(Some(&snap), None));
        assert_eq!(out.tickers(), vec!["PAYER", "EDGE"]);
    }

    #[test]
    fn empty_snapshot_keeps_everything_at_zero_floor() {
        let snap = snapshot(vec![]);
        let set = candidates(&["A", "B"]);
        let out = DividendFilter::new(0.0).apply(&set, &StageInputs::new(Some(&snap), None));
        assert_eq!(out, set);
    }

    #[test]
    fn no_fundamentals_is_a_no_op() {
        let set = candidates(&["A"]);
        assert_eq!(DividendFilter::new(0.5).apply(&set, &StageInputs::default()), set);
    }
}
