//! Liquidity filter on average daily volume.
//!
//! Average volume is the first present value of `averageVolume`,
//! `averageVolume10days`, `volume`, in that order. Rows with none of the
//! three, or with no fundamentals record at all, are excluded.

use crate::config::VolumeParams;
use crate::domain::CandidateSet;

use super::{DataNeeds, Stage, StageInputs};

#[derive(Debug, Clone)]
pub struct VolumeFilter {
    pub min_avg_volume: f64,
}

impl VolumeFilter {
    pub fn new(min_avg_volume: f64) -> Self {
        Self { min_avg_volume }
    }

    pub fn from_params(params: &VolumeParams) -> Self {
        Self::new(params.min_avg_volume)
    }
}

impl Stage for VolumeFilter {
    fn name(&self) -> &str {
        "volume"
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
                .and_then(|f| f.avg_volume())
                .is_some_and(|v| v >= self.min_avg_volume)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::test_support::{candidates, record, snapshot};

    #[test]
    fn uses_fallback_chain() {
        let snap = snapshot(vec![
            record("A", |r| r.average_volume = Some(200_000.0)),
            record("B", |r| r.average_volume_10days = Some(150_000.0)),
            record("C", |r| r.volume = Some(120_000.0)),
            record("D", |r| {
                r.average_volume = Some(50_000.0);
                r.volume = Some(900_000.0);
            }),
            record("E", |_| {}),
        ]);
        let set = candidates(&["A", "B", "C", "D", "E", "F"]);
        let out = VolumeFilter::new(100_000.0).apply(&set, &StageInputs::new(Some(&snap), None));
        // D: averageVolume wins over volume even though volume would pass.
        assert_eq!(out.tickers(), vec!["A", "B", "C"]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let snap = snapshot(vec![record("A", |r| r.average_volume = Some(100_000.0))]);
        let out = VolumeFilter::new(100_000.0)
            .apply(&candidates(&["A"]), &StageInputs::new(Some(&snap), None));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn no_fundamentals_is_a_no_op() {
        let set = candidates(&["A", "B"]);
        let out = VolumeFilter::new(1e12).apply(&set, &StageInputs::default());
        assert_eq!(out, set);
    }

    #[test]
    fn empty_fundamentals_excludes_everything() {
        let snap = snapshot(vec![]);
        let out = VolumeFilter::new(0.0)
            .apply(&candidates(&["A", "B"]), &StageInputs::new(Some(&snap), None));
        assert!(out.is_empty());
    }
}
