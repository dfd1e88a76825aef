//! Price band filter.
//!
//! Keeps rows whose price lies in `[min_price, max_price]`. Either bound may
//! be absent. Needs no external data.

use crate::config::PriceParams;
use crate::domain::CandidateSet;

use super::{DataNeeds, Stage, StageInputs};

#[derive(Debug, Clone)]
pub struct PriceFilter {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl PriceFilter {
    pub fn new(min_price: Option<f64>, max_price: Option<f64>) -> Self {
        Self {
            min_price,
            max_price,
        }
    }

    pub fn from_params(params: &PriceParams) -> Self {
        Self::new(params.min_price, params.max_price)
    }

    fn admits(&self, price: f64) -> bool {
        self.min_price.map_or(true, |min| price >= min)
            && self.max_price.map_or(true, |max| price <= max)
    }
}

impl Stage for PriceFilter {
    fn name(&self) -> &str {
        "price"
    }

    fn needs(&self) -> DataNeeds {
        DataNeeds::NONE
    }

    fn apply(&self, candidates: &CandidateSet, _inputs: &StageInputs<'_>) -> CandidateSet {
        candidates.retain_where(|row| row.price.is_some_and(|p| self.admits(p)))
    }
}
