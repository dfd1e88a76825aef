//! Candidate set — the working table threaded through the filter pipeline.
//!
//! A `CandidateSet` is an ordered list of `PricedTicker` rows with unique
//! tickers. Stages never mutate a set in place; they derive a narrower one
//! with [`CandidateSet::retain_where`], which keeps survivors in input order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One row of the priced universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedTicker {
    pub ticker: String,
    /// Latest price. `None` means the price could not be resolved.
    pub price: Option<f64>,
}

impl PricedTicker {
    pub fn new(ticker: impl Into<String>, price: f64) -> Self {
        Self {
            ticker: ticker.into(),
            price: Some(price),
        }
    }

    /// A row whose price could not be resolved.
    pub fn unpriced(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            price: None,
        }
    }

    /// The price, if it is usable (finite and strictly positive).
    pub fn usable_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite() && *p > 0.0)
    }

    pub fn has_price(&self) -> bool {
        self.usable_price().is_some()
    }
}

/// Ordered set of candidate rows, unique by ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateSet {
    rows: Vec<PricedTicker>,
}

impl CandidateSet {
    /// Build a set from rows. Duplicate tickers keep their first occurrence.
    pub fn new(rows: impl IntoIterator<Item = PricedTicker>) -> Self {
        let mut seen = HashSet::new();
        let rows = rows
            .into_iter()
            .filter(|row| seen.insert(row.ticker.clone()))
            .collect();
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[PricedTicker] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PricedTicker> {
        self.rows.iter()
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.ticker.as_str()).collect()
    }

    pub fn get(&self, ticker: &str) -> Option<&PricedTicker> {
        self.rows.iter().find(|r| r.ticker == ticker)
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.get(ticker).is_some()
    }

    /// Stable filter: a new set holding the rows for which `keep` is true.
    pub fn retain_where<F>(&self, mut keep: F) -> CandidateSet
    where
        F: FnMut(&PricedTicker) -> bool,
    {
        Self {
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Drop every row without a usable price. Returns the number dropped.
    pub fn drop_unpriced(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(PricedTicker::has_price);
        before - self.rows.len()
    }

    /// True when every ticker in `self` also appears in `other`.
    pub fn is_subset_of(&self, other: &CandidateSet) -> bool {
        let theirs: HashSet<&str> = other.rows.iter().map(|r| r.ticker.as_str()).collect();
        self.rows.iter().all(|r| theirs.contains(r.ticker.as_str()))
    }

    pub fn into_rows(self) -> Vec<PricedTicker> {
        self.rows
    }
}

impl FromIterator<PricedTicker> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = PricedTicker>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a PricedTicker;
    type IntoIter = std::slice::Iter<'a, PricedTicker>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
