//! Synthetic market for demos, benchmarks and tests.
//!
//! Produces a deterministic universe (`SYN000`, `SYN001`, ...), a random-walk
//! close history per ticker, latest prices equal to the last close, and
//! fundamentals with random gaps. The same `(size, seed)` always yields the
//! same market. Output is clearly fake and the runner tags runs that use it.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use eqscreen_core::domain::{FundamentalsRecord, FundamentalsSnapshot, PriceHistory, PricedTicker};

use crate::sources::{
    trim_to_lookback, FundamentalsSource, HistorySource, PriceSource, SourceError, UniverseSource,
};

const SECTORS: [&str; 8] = [
    "Technology",
    "Healthcare",
    "Financial Services",
    "Energy",
    "Utilities",
    "Industrials",
    "Consumer Defensive",
    "Consumer Cyclical",
];

/// Calendar span of generated history.
const HISTORY_CALENDAR_DAYS: i64 = 730;

#[derive(Debug, Clone)]
pub struct SyntheticMarket {
    size: usize,
    seed: u64,
    /// Last generated trading day.
    as_of: NaiveDate,
}

impl SyntheticMarket {
    pub fn new(size: usize, seed: u64) -> Self {
        Self {
            size,
            seed,
            as_of: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn tickers(&self) -> Vec<String> {
        (0..self.size).map(|i| format!("SYN{i:03}")).collect()
    }

    /// Deterministic generator per `(seed, ticker, stream)`.
    fn rng(&self, ticker: &str, stream: &str) -> StdRng {
        let key = format!("{}:{ticker}:{stream}", self.seed);
        StdRng::from_seed(*blake3::hash(key.as_bytes()).as_bytes())
    }

    fn trading_days(&self) -> Vec<NaiveDate> {
        let start = self.as_of - chrono::Duration::days(HISTORY_CALENDAR_DAYS);
        start
            .iter_days()
            .take_while(|d| *d <= self.as_of)
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .collect()
    }

    /// Close series for one ticker: a random walk with a per-ticker drift and
    /// daily volatility. Roughly one ticker in twenty is a recent listing whose
    /// early rows are gaps.
    fn closes(&self, ticker: &str, rows: usize) -> Vec<Option<f64>> {
        let mut rng = self.rng(ticker, "history");
        let daily_vol: f64 = rng.gen_range(0.004..0.06);
        let drift: f64 = rng.gen_range(-0.0008..0.0012);
        let listed_from = if rng.gen_bool(0.05) {
            rng.gen_range(rows / 2..rows)
        } else {
            0
        };

        let mut price: f64 = rng.gen_range(2.0..600.0);
        (0..rows)
            .map(|i| {
                let shock: f64 = rng.gen_range(-1.0..1.0) * daily_vol * 3f64.sqrt();
                price *= 1.0 + drift + shock;
                price = price.max(0.01);
                (i >= listed_from).then_some(price)
            })
            .collect()
    }

    fn record(&self, ticker: &str) -> FundamentalsRecord {
        let mut rng = self.rng(ticker, "fundamentals");
        let maybe = |rng: &mut StdRng, lo: f64, hi: f64| {
            rng.gen_bool(0.85).then(|| rng.gen_range(lo..hi))
        };

        let mut r = FundamentalsRecord::new(ticker);
        r.average_volume = maybe(&mut rng, 10_000.0, 20_000_000.0);
        r.average_volume_10days = maybe(&mut rng, 10_000.0, 20_000_000.0);
        r.volume = maybe(&mut rng, 10_000.0, 20_000_000.0);
        r.market_cap = maybe(&mut rng, 2e8, 2e12);
        r.trailing_pe = maybe(&mut rng, -20.0, 120.0);
        r.forward_pe = maybe(&mut rng, 5.0, 80.0);
        r.dividend_yield = maybe(&mut rng, 0.0, 0.07);
        r.beta = maybe(&mut rng, -0.3, 2.8);
        r.sector = rng
            .gen_bool(0.9)
            .then(|| SECTORS[rng.gen_range(0..SECTORS.len())].to_string());
        r
    }

    /// Full generated history for the requested tickers.
    pub fn full_history(&self, symbols: &[String]) -> PriceHistory {
        let dates = self.trading_days();
        let rows = dates.len();
        let mut history = PriceHistory::new(dates).unwrap_or_default();
        for symbol in symbols {
            let _ = history.insert_column(symbol.clone(), self.closes(symbol, rows));
        }
        history
    }
}

impl UniverseSource for SyntheticMarket {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn symbols(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.tickers())
    }
}

impl PriceSource for SyntheticMarket {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn latest_prices(&self, symbols: &[String]) -> Result<Vec<PricedTicker>, SourceError> {
        let rows = self.trading_days().len();
        Ok(symbols
            .iter()
            .filter_map(|s| {
                let last = self.closes(s, rows).last().copied().flatten()?;
                Some(PricedTicker::new(s.clone(), last))
            })
            .collect())
    }
}

impl FundamentalsSource for SyntheticMarket {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fundamentals(&self, symbols: &[String]) -> Result<FundamentalsSnapshot, SourceError> {
        Ok(symbols.iter().map(|s| self.record(s)).collect())
    }
}

impl HistorySource for SyntheticMarket {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn history(&self, symbols: &[String], lookback_days: u32) -> Result<PriceHistory, SourceError> {
        Ok(trim_to_lookback(&self.full_history(symbols), lookback_days))
    }
}
