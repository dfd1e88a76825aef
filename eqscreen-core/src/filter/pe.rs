//! Valuation ceiling on price/earnings.
//!
//! Uses `trailingPE`, falling back to `forwardPE` when trailing is absent.
//! Rows with neither are excluded. Negative P/E (loss-making companies)
//! passes any non-negative ceiling; screen those out with a market-cap or
//! custom stage if needed.

use crate::config::PeParams;
use crate::domain::CandidateSet;

use super::{DataNeeds, Stage, StageInputs};

#[derive(Debug, Clone)]
pub struct PeFilter {
    pub max_pe: f64,
}

impl PeFilter {
    pub fn new(max_pe: f64) -> Self {
        Self { max_pe }
    }

    pub fn from_params(params: &PeParams) -> Self {
        Self::new(params.max_pe)
    }
}

impl Stage for PeFilter {
    fn name(&self) -> &str {
        "pe"
    }

    fn needs(&self) -> DataNeeds {
        DataNeeds::FUNDAMENTALS
    }

    fn apply(&self, candidates: &CandidateSet, inputs: &StageInputs<'_>) -> CandidateSet {
        let Some(fundamentals) = inputs.fundamentals else {
            return candidates.clone();
        };
        candidates.retain_where(|row| {
            fundamentals
                .get(&row.ticker)
                .and_then(|f| f.pe())
                .is_some_and(|pe| pe <= self.max_pe)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::test_support::{candidates, record, snapshot};

    #[test]
    fn forward_pe_fallback_retains_row() {
        let snap = snapshot(vec![record("A", |r| r.forward_pe = Some(40.0))]);
        let out = PeFilter::new(50.0).apply(&candidates(&["A"]), &StageInputs::new(Some(&snap), None));
        assert_eq!(out.tickers(), vec!["A"]);
    }

    #[test]
    fn both_absent_excludes_row() {
        let snap = snapshot(vec![record("A", |_| {})]);
        let out = PeFilter::new(50.0).apply(&candidates(&["A"]), &StageInputs::new(Some(&snap), None));
        assert!(out.is_empty());
    }

    #[test]
    fn trailing_takes_precedence_over_forward() {
        let snap = snapshot(vec![
            record("RICH", |r| {
                r.trailing_pe = Some(80.0);
                r.forward_pe = Some(20.0);
            }),
            record("CHEAP", |r| {
                r.trailing_pe = Some(15.0);
                r.forward_pe = Some(90.0);
            }),
            record("EDGE", |r| r.trailing_pe = Some(50.0)),
        ]);
        let set = candidates(&["RICH", "CHEAP", "EDGE"]);
        let out = PeFilter::new(50.0).apply(&set, &StageInputs::new(Some(&snap), None));
        assert_eq!(out.tickers(), vec!["CHEAP", "EDGE"]);
    }

    #[test]
    fn no_fundamentals_is_a_no_op() {
        let set = candidates(&["A", "B"]);
        assert_eq!(PeFilter::new(0.0).apply(&set, &StageInputs::default()), set);
    }
}
