//! Beta ceiling. Absent beta excludes the row.

use crate::config::BetaParams;
use crate::domain::CandidateSet;

use super::{DataNeeds, Stage, StageInputs};

#[derive(Debug, Clone)]
pub struct BetaFilter {
    pub max_beta: f64,
}

impl BetaFilter {
    pub fn new(max_beta: f64) -> Self {
        Self { max_beta }
    }

    pub fn from_params(params: &BetaParams) -> Self {
        Self::new(params.max_beta)
    }
}

impl Stage for BetaFilter {
    fn name(&self) -> &str {
        "beta"
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
                .and_then(|f| f.beta)
                .is_some_and(|beta| beta <= self.max_beta)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::test_support::{candidates, record, snapshot};

    #[test]
    fn keeps_beta_at_or_below_ceiling() {
        let snap = snapshot(vec![
            record("LOW", |r| r.beta = Some(0.6)),
            record("EDGE", |r| r.beta = Some(2.0)),
            record("HIGH", |r| r.beta = Some(2.4)),
            record("NONE", |_| {}),
        ]);
        let set = candidates(&["LOW", "EDGE", "HIGH", "NONE"]);
        let out = BetaFilter::new(2.0).apply(&set, &StageInputs::new(Some(&snap), None));
        assert_eq!(out.tickers(), vec!["LOW", "EDGE"]);
    }

    #[test]
    fn no_fundamentals_is_a_no_op() {
        let set = candidates(&["A", "B"]);
        assert_eq!(BetaFilter::new(0.0).apply(&set, &StageInputs::default()), set);
    }
}
