//! Price history matrix — adjusted closes indexed by date, one column per ticker.
//!
//! Rows are kept in ascending date order. A cell is `None` when the ticker has
//! no close for that date (not yet listed, halted, or missing from the feed).

use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

/// Fixed trading-days-per-month approximation used by momentum lookbacks.
pub const TRADING_DAYS_PER_MONTH: usize = 21;

#[derive(Debug, Error, PartialEq)]
pub enum HistoryError {
    #[error("column '{ticker}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        ticker: String,
        expected: usize,
        actual: usize,
    },

    #[error("dates must be strictly ascending (row {row})")]
    UnsortedDates { row: usize },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    dates: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl PriceHistory {
    /// An empty matrix over the given (strictly ascending) dates.
    pub fn new(dates: Vec<NaiveDate>) -> Result<Self, HistoryError> {
        if let Some(row) = dates.windows(2).position(|w| w[0] >= w[1]) {
            return Err(HistoryError::UnsortedDates { row: row + 1 });
        }
        Ok(Self {
            dates,
            columns: BTreeMap::new(),
        })
    }

    /// Add or replace a ticker column. Non-finite and non-positive closes are stored as gaps.
    pub fn insert_column(
        &mut self,
        ticker: impl Into<String>,
        closes: Vec<Option<f64>>,
    ) -> Result<(), HistoryError> {
        let ticker = ticker.into();
        if closes.len() != self.dates.len() {
            return Err(HistoryError::LengthMismatch {
                ticker,
                expected: self.dates.len(),
                actual: closes.len(),
            });
        }
        let cleaned = closes
            .into_iter()
            .map(|c| c.filter(|v| v.is_finite() && *v > 0.0))
            .collect();
        self.columns.insert(ticker, cleaned);
        Ok(())
    }

    /// Builder form of [`insert_column`](Self::insert_column).
    pub fn with_column(
        mut self,
        ticker: impl Into<String>,
        closes: Vec<Option<f64>>,
    ) -> Result<Self, HistoryError> {
        self.insert_column(ticker, closes)?;
        Ok(self)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of rows (dates).
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn column(&self, ticker: &str) -> Option<&[Option<f64>]> {
        self.columns.get(ticker).map(|c| c.as_slice())
    }

    /// Daily simple returns `p_t / p_{t-1} - 1`, one per row after the first.
    /// A return is `None` when either close is missing.
    pub fn daily_returns(&self, ticker: &str) -> Option<Vec<Option<f64>>> {
        let closes = self.column(ticker)?;
        Some(
            closes
                .windows(2)
                .map(|w| match (w[0], w[1]) {
                    (Some(prev), Some(cur)) => Some(cur / prev - 1.0),
                    _ => None,
                })
                .collect(),
        )
    }

    /// Sample standard deviation of the last `window` daily returns, as of the
    /// most recent row. `None` when the ticker has fewer than `window` returns,
    /// a gap falls inside the window, or `window < 2`.
    pub fn trailing_volatility(&self, ticker: &str, window: usize) -> Option<f64> {
        if window < 2 {
            return None;
        }
        let returns = self.daily_returns(ticker)?;
        if returns.len() < window {
            return None;
        }
        let tail: Option<Vec<f64>> = returns[returns.len() - window..].iter().copied().collect();
        let tail = tail?;
        let n = tail.len() as f64;
        let mean = tail.iter().sum::<f64>() / n;
        let var = tail.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(var.sqrt())
    }

    /// Return from `lookback` rows ago to the most recent row:
    /// `latest / base - 1`. `None` when the lookback runs past the first row
    /// or either endpoint is missing.
    pub fn trailing_return(&self, ticker: &str, lookback: usize) -> Option<f64> {
        let closes = self.column(ticker)?;
        if closes.len() <= lookback {
            return None;
        }
        let last = closes.len() - 1;
        let latest = closes[last]?;
        let base = closes[last - lookback]?;
        Some(latest / base - 1.0)
    }

    /// Rows dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> PriceHistory {
        let first = self.dates.partition_point(|d| *d < start);
        PriceHistory {
            dates: self.dates[first..].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|(t, c)| (t.clone(), c[first..].to_vec()))
                .collect(),
        }
    }

    /// Only the columns for `tickers`; unknown tickers are ignored.
    pub fn select<S: AsRef<str>>(&self, tickers: &[S]) -> PriceHistory {
        PriceHistory {
            dates: self.dates.clone(),
            columns: tickers
                .iter()
                .filter_map(|t| {
                    self.columns
                        .get_key_value(t.as_ref())
                        .map(|(k, v)| (k.clone(), v.clone()))
                })
                .collect(),
        }
    }
}
