//! Sector allow/deny lists.
//!
//! A non-empty `include` list is the only set of sectors allowed; rows with no
//! sector fail it. The `exclude` list is always subtracted, and a missing
//! sector never matches it, so with only an exclude list unknown-sector rows
//! survive. Matching is exact.

use std::collections::HashSet;

use crate::config::SectorParams;
use crate::domain::CandidateSet;

use super::{DataNeeds, Stage, StageInputs};

#[derive(Debug, Clone)]
pub struct SectorFilter {
    include: Option<HashSet<String>>,
    exclude: HashSet<String>,
}

impl SectorFilter {
    /// `include = None` or an empty list allows every sector.
    pub fn new(include: Option<Vec<String>>, exclude: Vec<String>) -> Self {
        Self {
            include: include
                .filter(|list| !list.is_empty())
                .map(|list| list.into_iter().collect()),
            exclude: exclude.into_iter().collect(),
        }
    }

    pub fn from_params(params: &SectorParams) -> Self {
        Self::new(params.include.clone(), params.exclude.clone())
    }

    fn admits(&self, sector: Option<&str>) -> bool {
        if let Some(include) = &self.include {
            if !sector.is_some_and(|s| include.contains(s)) {
                return false;
            }
        }
        !sector.is_some_and(|s| self.exclude.contains(s))
    }
}

impl Stage for SectorFilter {
    fn name(&self) -> &str {
        "sector"
    }

    fn needs(&self) -> DataNeeds {
        DataNeeds::FUNDAMENTALS
    }

    fn apply(&self, candidates: &CandidateSet, inputs: &StageInputs<'_>) -> CandidateSet {
        let Some(fundamentals) = inputs.fundamentals else {
            return candidates.clone();
        };
        candidates.retain_where(|row| {
            let sector = fundamentals
                .get(&row.ticker)
                .and_then(|f| f.sector.as_deref());
            self.admits(sector)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FundamentalsSnapshot;
    use crate::filter::test_support::{candidates, record, snapshot};

    fn sectors() -> FundamentalsSnapshot {
        snapshot(vec![
            record("AAPL", |r| r.sector = Some("Technology".into())),
            record("XOM", |r| r.sector = Some("Energy".into())),
            record("DUK", |r| r.sector = Some("Utilities".into())),
            record("ANON", |_| {}),
        ])
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn include_list_is_exclusive() {
        let snap = sectors();
        let f = SectorFilter::new(Some(strings(&["Technology", "Energy"])), vec![]);
        let out = f.apply(
            &candidates(&["AAPL", "XOM", "DUK", "ANON"]),
            &StageInputs::new(Some(&snap), None),
        );
        assert_eq!(out.tickers(), vec!["AAPL", "XOM"]);
    }

    #[test]
    fn exclude_list_keeps_unknown_sectors() {
        let snap = sectors();
        let f = SectorFilter::new(None, strings(&["Utilities"]));
        let out = f.apply(
            &candidates(&["AAPL", "XOM", "DUK", "ANON", "MISSING"]),
            &StageInputs::new(Some(&snap), None),
        );
        assert_eq!(out.tickers(), vec!["AAPL", "XOM", "ANON", "MISSING"]);
    }

    #[test]
    fn exclude_subtracts_from_include() {
        let snap = sectors();
        let f = SectorFilter::new(Some(strings(&["Technology", "Energy"])), strings(&["Energy"]));
        let out = f.apply(&candidates(&["AAPL", "XOM"]), &StageInputs::new(Some(&snap), None));
        assert_eq!(out.tickers(), vec!["AAPL"]);
    }

    #[test]
    fn empty_include_list_means_no_restriction() {
        let snap = sectors();
        let f = SectorFilter::new(Some(vec![]), vec![]);
        let set = candidates(&["AAPL", "ANON"]);
        assert_eq!(f.apply(&set, &StageInputs::new(Some(&snap), None)), set);
    }

    #[test]
    fn no_fundamentals_is_a_no_op() {
        let f = SectorFilter::new(Some(strings(&["Energy"])), vec![]);
        let set = candidates(&["AAPL"]);
        assert_eq!(f.apply(&set, &StageInputs::default()), set);
    }
}
