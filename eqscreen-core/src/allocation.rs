//! Equal-weight allocation of a fixed portfolio across surviving candidates.
//!
//! Every holding gets weight `1/n` and the same dollar target. Whole-share
//! mode floors the share count so the invested amount never exceeds the
//! portfolio; fractional mode invests the target exactly.

use serde::{Deserialize, Serialize};

use crate::domain::CandidateSet;

/// One holding of the allocation table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRow {
    pub ticker: String,
    pub price: f64,
    pub weight: f64,
    pub dollar_allocation: f64,
    pub shares: f64,
}

impl AllocationRow {
    /// Cash actually spent on this holding.
    pub fn invested(&self) -> f64 {
        self.shares * self.price
    }
}

/// Allocation table, sorted by ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    rows: Vec<AllocationRow>,
}

impl AllocationResult {
    pub fn rows(&self) -> &[AllocationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.rows.iter().map(|r| r.weight).sum()
    }

    pub fn invested(&self) -> f64 {
        self.rows.iter().map(AllocationRow::invested).sum()
    }
}

/// Split `portfolio_size` equally across the priced rows of `candidates`.
///
/// Rows without a usable price are not allocated and do not count toward `n`.
///
/// # Panics
/// If `portfolio_size` is not a positive finite number.
pub fn allocate(
    candidates: &CandidateSet,
    portfolio_size: f64,
    allow_fractional: bool,
) -> AllocationResult {
    assert!(
        portfolio_size.is_finite() && portfolio_size > 0.0,
        "portfolio_size must be positive, got {portfolio_size}"
    );

    let mut priced: Vec<(&str, f64)> = candidates
        .iter()
        .filter_map(|row| row.usable_price().map(|p| (row.ticker.as_str(), p)))
        .collect();
    if priced.is_empty() {
        return AllocationResult::default();
    }
    priced.sort_by(|a, b| a.0.cmp(b.0));

    let n = priced.len() as f64;
    let weight = 1.0 / n;
    let dollar_allocation = weight * portfolio_size;

    // Whole shares also respect the running total, so the summed cost never
    // exceeds the portfolio even when per-row targets round up.
    let mut invested = 0.0;
    let rows = priced
        .into_iter()
        .map(|(ticker, price)| {
            let mut shares = share_count(dollar_allocation, price, allow_fractional);
            if !allow_fractional {
                while shares > 0.0 && invested + shares * price > portfolio_size {
                    shares -= 1.0;
                }
                invested += shares * price;
            }
            AllocationRow {
                ticker: ticker.to_string(),
                price,
                weight,
                dollar_allocation,
                shares,
            }
        })
        .collect();

    AllocationResult { rows }
}

fn share_count(dollars: f64, price: f64, allow_fractional: bool) -> f64 {
    if allow_fractional {
        return dollars / price;
    }
    let mut shares = (dollars / price).floor();
    // The quotient can round up across an integer boundary.
    while shares > 0.0 && shares * price > dollars {
        shares -= 1.0;
    }
    shares
}

/// Headline numbers for an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub n_stocks: usize,
    pub invested: f64,
    pub remaining_cash: f64,
    pub total_portfolio: f64,
}

pub fn summary_stats(result: &AllocationResult, portfolio_size: f64) -> SummaryStats {
    let invested = result.invested();
    SummaryStats {
        n_stocks: result.len(),
        invested,
        remaining_cash: portfolio_size - invested,
        total_portfolio: portfolio_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PricedTicker;

    fn set(rows: &[(&str, f64)]) -> CandidateSet {
        rows.iter().map(|(t, p)| PricedTicker::new(*t, *p)).collect()
    }

    #[test]
    fn empty_candidates_give_empty_result() {
        let result = allocate(&CandidateSet::empty(), 1_000.0, false);
        assert!(result.is_empty());
        let stats = summary_stats(&result, 1_000.0);
        assert_eq!(stats.n_stocks, 0);
        assert_eq!(stats.invested, 0.0);
        assert_eq!(stats.remaining_cash, 1_000.0);
    }

    #[test]
    fn single_holding_takes_everything() {
        let result = allocate(&set(&[("A", 10.0)]), 1_000.0, false);
        let row = &result.rows()[0];
        assert_eq!(row.weight, 1.0);
        assert_eq!(row.dollar_allocation, 1_000.0);
        assert_eq!(row.shares, 100.0);
        assert_eq!(row.price, 10.0);
    }

    #[test]
    fn whole_shares_stay_within_portfolio_for_exact_divisor_prices() {
        // Each price equals the per-holding target, but the seven together
        // sum to slightly more than the portfolio.
        let price = (1.0 / 7.0) * 1_000.0;
        let rows: Vec<(&str, f64)> =
            ["A", "B", "C", "D", "E", "F", "G"].iter().map(|t| (*t, price)).collect();

        let result = allocate(&set(&rows), 1_000.0, false);
        let stats = summary_stats(&result, 1_000.0);
        assert!(stats.invested <= 1_000.0, "invested {}", stats.invested);
        assert!(stats.remaining_cash >= 0.0);
        assert_eq!(result.rows().iter().filter(|r| r.shares == 1.0).count(), 6);
    }

    #[test]
    fn rows_sorted_by_ticker() {
        let result = allocate(&set(&[("MSFT", 400.0), ("AAPL", 190.0), ("KO", 60.0)]), 9_000.0, false);
        let tickers: Vec<&str> = result.rows().iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAPL", "KO", "MSFT"]);
    }

    #[test]
    fn whole_shares_are_floored() {
        let result = allocate(&set(&[("A", 30.0), ("B", 7.0)]), 100.0, false);
        // $50 each: 1 share of A, 7 shares of B.
        assert_eq!(result.rows()[0].shares, 1.0);
        assert_eq!(result.rows()[1].shares, 7.0);
        let stats = summary_stats(&result, 100.0);
        assert_eq!(stats.invested, 79.0);
        assert_eq!(stats.remaining_cash, 21.0);
        assert_eq!(stats.total_portfolio, 100.0);
    }

    #[test]
    fn price_above_allocation_buys_nothing() {
        let result = allocate(&set(&[("BRK", 600_000.0), ("A", 10.0)]), 1_000.0, false);
        assert_eq!(result.rows()[1].ticker, "BRK");
        assert_eq!(result.rows()[1].shares, 0.0);
    }

    #[test]
    fn fractional_shares_invest_the_target() {
        let result = allocate(&set(&[("A", 30.0), ("B", 7.0), ("C", 13.0)]), 100.0, true);
        assert!((result.invested() - 100.0).abs() < 1e-9);
        assert!((result.total_weight() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unpriced_rows_are_not_allocated() {
        let candidates = CandidateSet::new(vec![
            PricedTicker::new("A", 10.0),
            PricedTicker::unpriced("B"),
        ]);
        let result = allocate(&candidates, 1_000.0, false);
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows()[0].weight, 1.0);
    }

    #[test]
    fn floor_guard_never_overshoots() {
        for price in [0.1, 0.3, 0.7, 1.1, 3.3, 33.33] {
            let shares = share_count(100.0 / 3.0, price, false);
            assert!(shares * price <= 100.0 / 3.0);
            assert!((shares + 1.0) * price > 100.0 / 3.0);
        }
    }

    #[test]
    #[should_panic(expected = "portfolio_size must be positive")]
    fn non_positive_portfolio_panics() {
        allocate(&set(&[("A", 10.0)]), 0.0, false);
    }
}
