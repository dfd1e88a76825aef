//! Market capitalization floor. Absent `marketCap` excludes the row.

use crate::config::MarketCapParams;
use crate::domain::CandidateSet;

use super::{DataNeeds, Stage, StageInputs};

#[derive(Debug, Clone)]
pub struct MarketCapFilter {
    pub min_mcap: f64,
}

impl MarketCapFilter {
    pub fn new(min_mcap: f64) -> Self {
        Self { min_mcap }
    }

    pub fn from_params(params: &MarketCapParams) -> Self {
        Self::new(params.min_mcap)
    }
}

impl Stage for MarketCapFilter {
    fn name(&self) -> &str {
        "marketcap"
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
                .and_then(|f| f.market_cap)
                .is_some_and(|cap| cap >= self.min_mcap)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::test_support::{candidates, record, snapshot};

    #[test]
    fn keeps_caps_at_or_above_floor() {
        let snap = snapshot(vec![
            record("BIG", |r| r.market_cap = Some(2e12)),
            record("EDGE", |r| r.market_cap = Some(1e9)),
            record("SMALL", |r| r.market_cap = Some(3e8)),
            record("NONE", |_| {}),
        ]);
        let set = candidates(&["BIG", "EDGE", "SMALL", "NONE", "UNKNOWN"]);
        let out = MarketCapFilter::new(1e9).apply(&set, &StageInputs::new(Some(&snap), None));
        assert_eq!(out.tickers(), vec!["BIG", "EDGE"]);
    }

    #[test]
    fn no_fundamentals_is_a_no_op() {
        let set = candidates(&["A"]);
        assert_eq!(MarketCapFilter::new(1e9).apply(&set, &StageInputs::default()), set);
    }
}
