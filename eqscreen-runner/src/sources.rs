//! Data source traits and file/HTTP implementations.
//!
//! The traits abstract over where the universe, prices, fundamentals and
//! history come from so the runner can swap implementations and tests can
//! substitute fixtures. Sources know nothing about the pipeline; degradation
//! rules live in [`crate::fetch`].

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use rayon::prelude::*;
use thiserror::Error;

use eqscreen_core::data::{
    fundamentals_from_frame, history_from_frame, prices_from_frame, read_table, IngestError,
};
use eqscreen_core::domain::{FundamentalsRecord, FundamentalsSnapshot, PriceHistory, PricedTicker};

/// Public S&P 500 constituents table (one row per company, `Symbol` column).
pub const DEFAULT_CONSTITUENTS_URL: &str =
    "https://raw.githubusercontent.com/datasets/s-and-p-500-companies/master/data/constituents.csv";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("network error: {0}")]
    Http(String),

    #[error("malformed data: {0}")]
    Format(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

// ─── Traits ─────────────────────────────────────────────────────────

/// Ordered, unique symbols to screen. An empty list is valid.
pub trait UniverseSource: Send + Sync {
    fn name(&self) -> &str;
    fn symbols(&self) -> Result<Vec<String>, SourceError>;
}

/// Latest prices. Symbols whose price cannot be resolved are omitted.
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;
    fn latest_prices(&self, symbols: &[String]) -> Result<Vec<PricedTicker>, SourceError>;
}

/// Point-in-time fundamentals, one record per symbol with per-field absence.
pub trait FundamentalsSource: Send + Sync {
    fn name(&self) -> &str;
    fn fundamentals(&self, symbols: &[String]) -> Result<FundamentalsSnapshot, SourceError>;
}

/// Daily adjusted closes covering the last `lookback_days` calendar days.
pub trait HistorySource: Send + Sync {
    fn name(&self) -> &str;
    fn history(&self, symbols: &[String], lookback_days: u32) -> Result<PriceHistory, SourceError>;
}

// ─── Symbol lists ───────────────────────────────────────────────────

/// Parse a symbol list: either a CSV with a `Symbol`/`Ticker` header column,
/// or one symbol per line (first comma-separated field).
///
/// Symbols are trimmed, `.` becomes `-` (share classes in provider form),
/// blank lines and `#` comments are skipped, and duplicates keep their first
/// occurrence.
pub fn parse_symbols(text: &str) -> Result<Vec<String>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let mut column = 0;
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    let mut push = |raw: &str, symbols: &mut Vec<String>| {
        let symbol = raw.trim().replace('.', "-");
        if !symbol.is_empty() && seen.insert(symbol.clone()) {
            symbols.push(symbol);
        }
    };

    if let Some(first) = records.next() {
        let first = first.map_err(|e| SourceError::Format(e.to_string()))?;
        match first
            .iter()
            .position(|f| f.eq_ignore_ascii_case("symbol") || f.eq_ignore_ascii_case("ticker"))
        {
            Some(idx) => column = idx,
            None => {
                if let Some(field) = first.get(0) {
                    push(field, &mut symbols);
                }
            }
        }
    }

    for record in records {
        let record = record.map_err(|e| SourceError::Format(e.to_string()))?;
        if let Some(field) = record.get(column) {
            push(field, &mut symbols);
        }
    }

    Ok(symbols)
}

/// Symbols from a local file.
#[derive(Debug, Clone)]
pub struct SymbolFile {
    path: PathBuf,
}

impl SymbolFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UniverseSource for SymbolFile {
    fn name(&self) -> &str {
        "symbol-file"
    }

    fn symbols(&self) -> Result<Vec<String>, SourceError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_symbols(&text)
    }
}

/// Constituents table downloaded over HTTP.
#[derive(Debug, Clone)]
pub struct ConstituentsUrl {
    url: String,
    timeout: Duration,
}

impl ConstituentsUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn sp500() -> Self {
        Self::new(DEFAULT_CONSTITUENTS_URL)
    }
}

impl UniverseSource for ConstituentsUrl {
    fn name(&self) -> &str {
        "constituents-url"
    }

    fn symbols(&self) -> Result<Vec<String>, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("eqscreen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Http(format!("build HTTP client: {e}")))?;

        tracing::info!(url = %self.url, "downloading constituents");
        let resp = client
            .get(&self.url)
            .send()
            .map_err(|e| SourceError::Http(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Http(format!("HTTP {status} for {}", self.url)));
        }
        let body = resp.text().map_err(|e| SourceError::Http(e.to_string()))?;
        parse_symbols(&body)
    }
}

// ─── Tables ─────────────────────────────────────────────────────────

/// Latest prices from a `Ticker,Price` CSV or Parquet table.
#[derive(Debug, Clone)]
pub struct PriceTable {
    path: PathBuf,
}

impl PriceTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PriceSource for PriceTable {
    fn name(&self) -> &str {
        "price-table"
    }

    fn latest_prices(&self, symbols: &[String]) -> Result<Vec<PricedTicker>, SourceError> {
        let df = read_table(&self.path)?;
        let mut by_ticker: HashMap<String, PricedTicker> = HashMap::new();
        for row in prices_from_frame(&df)? {
            by_ticker.entry(row.ticker.clone()).or_insert(row);
        }

        let rows: Vec<PricedTicker> = symbols
            .iter()
            .filter_map(|s| by_ticker.get(s))
            .filter(|row| row.has_price())
            .cloned()
            .collect();

        let omitted = symbols.len() - rows.len();
        if omitted > 0 {
            tracing::debug!(omitted, "symbols without a usable price");
        }
        Ok(rows)
    }
}

/// Fundamentals from a CSV or Parquet table with camelCase metric columns.
#[derive(Debug, Clone)]
pub struct FundamentalsTable {
    path: PathBuf,
}

impl FundamentalsTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FundamentalsSource for FundamentalsTable {
    fn name(&self) -> &str {
        "fundamentals-table"
    }

    fn fundamentals(&self, symbols: &[String]) -> Result<FundamentalsSnapshot, SourceError> {
        let df = read_table(&self.path)?;
        let all = fundamentals_from_frame(&df)?;
        Ok(symbols.iter().filter_map(|s| all.get(s).cloned()).collect())
    }
}

/// One provider info document per ticker: `<dir>/<TICKER>.json`.
///
/// Loaded in parallel. A missing or unreadable document yields an empty
/// record for that ticker rather than failing the whole snapshot.
#[derive(Debug, Clone)]
pub struct FundamentalsDir {
    dir: PathBuf,
}

impl FundamentalsDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn load_one(&self, symbol: &str) -> FundamentalsRecord {
        let path = self.dir.join(format!("{symbol}.json"));
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                serde_json::from_str::<FundamentalsRecord>(&text).map_err(|e| e.to_string())
            });
        match parsed {
            Ok(mut record) => {
                record.ticker = symbol.to_string();
                record
            }
            Err(e) => {
                tracing::debug!(symbol, path = %path.display(), error = %e, "no fundamentals document");
                FundamentalsRecord::new(symbol)
            }
        }
    }
}

impl FundamentalsSource for FundamentalsDir {
    fn name(&self) -> &str {
        "fundamentals-dir"
    }

    fn fundamentals(&self, symbols: &[String]) -> Result<FundamentalsSnapshot, SourceError> {
        if !self.dir.is_dir() {
            return Err(SourceError::Unavailable(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }
        let records: Vec<FundamentalsRecord> =
            symbols.par_iter().map(|s| self.load_one(s)).collect();
        Ok(FundamentalsSnapshot::new(records))
    }
}

/// Wide history table (`Date` plus one close column per ticker).
#[derive(Debug, Clone)]
pub struct HistoryTable {
    path: PathBuf,
}

impl HistoryTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistorySource for HistoryTable {
    fn name(&self) -> &str {
        "history-table"
    }

    fn history(&self, symbols: &[String], lookback_days: u32) -> Result<PriceHistory, SourceError> {
        let df = read_table(&self.path)?;
        let full = history_from_frame(&df)?.select(symbols);
        Ok(trim_to_lookback(&full, lookback_days))
    }
}

/// Rows within `lookback_days` calendar days of the latest date.
pub(crate) fn trim_to_lookback(history: &PriceHistory, lookback_days: u32) -> PriceHistory {
    match history.dates().last() {
        Some(last) => history.since(*last - chrono::Duration::days(i64::from(lookback_days))),
        None => history.clone(),
    }
}
