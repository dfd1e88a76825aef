use chrono::NaiveDate;
use polars::prelude::*;
use std::path::Path;

use crate::domain::{FundamentalsRecord, FundamentalsSnapshot, HistoryError, PriceHistory, PricedTicker};

/// Column names accepted for the symbol column, compared case-insensitively.
const TICKER_COLUMNS: [&str; 2] = ["ticker", "symbol"];
const DATE_COLUMNS: [&str; 2] = ["date", "datetime"];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Ingest failed: {0}")]
    IngestFailed(String),

    #[error("Unsupported table format: {0} (expected .csv or .parquet)")]
    UnsupportedFormat(String),

    #[error("Missing column '{0}'")]
    MissingColumn(String),

    #[error("Invalid date '{value}' at row {row}")]
    InvalidDate { row: usize, value: String },

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Read a CSV or Parquet file into a DataFrame, picking the reader by extension.
pub fn read_table(path: &Path) -> Result<DataFrame, IngestError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let failed = |e: PolarsError| IngestError::IngestFailed(format!("{}: {e}", path.display()));

    match ext.as_deref() {
        Some("csv") => CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(failed),
        Some("parquet") | Some("pq") => {
            let file = std::fs::File::open(path)
                .map_err(|e| IngestError::IngestFailed(format!("{}: {e}", path.display())))?;
            ParquetReader::new(file).finish().map_err(failed)
        }
        _ => Err(IngestError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Latest prices from a `Ticker`/`Price` table. Null tickers are skipped;
/// a null or non-finite price yields an unpriced row.
pub fn prices_from_frame(df: &DataFrame) -> Result<Vec<PricedTicker>, IngestError> {
    let tickers = str_values(df, find_column(df, &TICKER_COLUMNS)?)?;
    let prices = f64_values(df, find_column(df, &["price"])?)?;

    Ok(tickers
        .into_iter()
        .zip(prices)
        .filter_map(|(ticker, price)| {
            ticker.map(|t| PricedTicker {
                ticker: t,
                price,
            })
        })
        .collect())
}

/// Fundamentals from a table whose columns use the provider's camelCase keys.
/// Every metric column is optional.
pub fn fundamentals_from_frame(df: &DataFrame) -> Result<FundamentalsSnapshot, IngestError> {
    let tickers = str_values(df, find_column(df, &TICKER_COLUMNS)?)?;
    let trailing_pe = optional_f64_values(df, "trailingPE")?;
    let forward_pe = optional_f64_values(df, "forwardPE")?;
    let dividend_yield = optional_f64_values(df, "dividendYield")?;
    let beta = optional_f64_values(df, "beta")?;
    let market_cap = optional_f64_values(df, "marketCap")?;
    let average_volume = optional_f64_values(df, "averageVolume")?;
    let average_volume_10days = optional_f64_values(df, "averageVolume10days")?;
    let volume = optional_f64_values(df, "volume")?;
    let sector = match df.column("sector") {
        Ok(_) => str_values(df, "sector")?,
        Err(_) => vec![None; df.height()],
    };

    let records: Vec<FundamentalsRecord> = tickers
        .into_iter()
        .enumerate()
        .filter_map(|(i, ticker)| {
            ticker.map(|ticker| FundamentalsRecord {
                ticker,
                trailing_pe: trailing_pe[i],
                forward_pe: forward_pe[i],
                dividend_yield: dividend_yield[i],
                beta: beta[i],
                market_cap: market_cap[i],
                average_volume: average_volume[i],
                average_volume_10days: average_volume_10days[i],
                volume: volume[i],
                sector: sector[i].clone(),
            })
        })
        .collect();

    Ok(FundamentalsSnapshot::new(records))
}

/// Wide history table: a `Date` column (`YYYY-MM-DD`) plus one close column
/// per ticker. Rows are sorted by date; duplicate dates are an error.
pub fn history_from_frame(df: &DataFrame) -> Result<PriceHistory, IngestError> {
    let date_col = find_column(df, &DATE_COLUMNS)?;
    let raw_dates = str_values(df, date_col)?;

    let mut dated: Vec<(NaiveDate, usize)> = Vec::with_capacity(raw_dates.len());
    for (row, value) in raw_dates.into_iter().enumerate() {
        let value = value.unwrap_or_default();
        dated.push((parse_date(&value, row)?, row));
    }
    dated.sort_by_key(|(date, _)| *date);

    let mut history = PriceHistory::new(dated.iter().map(|(d, _)| *d).collect())?;
    for name in df.get_column_names() {
        let name = name.as_str();
        if name == date_col {
            continue;
        }
        let closes = f64_values(df, name)?;
        let ordered = dated.iter().map(|(_, row)| closes[*row]).collect();
        history.insert_column(name, ordered)?;
    }

    tracing::debug!(
        rows = history.len(),
        tickers = history.tickers().count(),
        "loaded price history"
    );
    Ok(history)
}

// ── Column helpers ──────────────────────────────────────────────────

fn find_column<'a>(df: &'a DataFrame, candidates: &[&str]) -> Result<&'a str, IngestError> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.as_str())
        .find(|name| {
            let lower = name.to_ascii_lowercase();
            candidates.iter().any(|c| lower == *c)
        })
        .ok_or_else(|| IngestError::MissingColumn(candidates.join("|")))
}

fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, IngestError> {
    let col = df
        .column(name)
        .map_err(|_| IngestError::MissingColumn(name.to_string()))?;
    let cast = col
        .cast(&DataType::Float64)
        .map_err(|e| IngestError::IngestFailed(format!("column '{name}' as float: {e}")))?;
    let ca = cast
        .f64()
        .map_err(|e| IngestError::IngestFailed(format!("column '{name}' type: {e}")))?;
    Ok(ca
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

fn optional_f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, IngestError> {
    if df.column(name).is_err() {
        return Ok(vec![None; df.height()]);
    }
    f64_values(df, name)
}

fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, IngestError> {
    let col = df
        .column(name)
        .map_err(|_| IngestError::MissingColumn(name.to_string()))?;
    let cast = col
        .cast(&DataType::String)
        .map_err(|e| IngestError::IngestFailed(format!("column '{name}' as string: {e}")))?;
    let ca = cast
        .str()
        .map_err(|e| IngestError::IngestFailed(format!("column '{name}' type: {e}")))?;
    Ok(ca
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(String::from))
        .collect())
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(value: &str, row: usize) -> Result<NaiveDate, IngestError> {
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| IngestError::InvalidDate {
        row,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn prices_keep_unpriced_rows_and_skip_null_tickers() {
        let df = df!(
            "Ticker" => [Some("AAPL"), Some("XYZ"), None],
            "Price" => [Some(190.5), None, Some(3.0)]
        )
        .unwrap();
        let rows = prices_from_frame(&df).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], PricedTicker::new("AAPL", 190.5));
        assert_eq!(rows[1], PricedTicker::unpriced("XYZ"));
    }

    #[test]
    fn symbol_column_is_accepted_case_insensitively() {
        let df = df!("symbol" => ["KO"], "price" => [60.0]).unwrap();
        let rows = prices_from_frame(&df).unwrap();
        assert_eq!(rows[0].ticker, "KO");
    }

    #[test]
    fn missing_price_column_is_reported() {
        let df = df!("Ticker" => ["KO"]).unwrap();
        assert!(matches!(
            prices_from_frame(&df),
            Err(IngestError::MissingColumn(_))
        ));
    }

    #[test]
    fn fundamentals_with_partial_columns() {
        let df = df!(
            "Ticker" => ["AAPL", "KO"],
            "trailingPE" => [Some(29.5), None],
            "forwardPE" => [Some(27.0), Some(22.0)],
            "beta" => [Some(1.2), Some(0.6)],
            "sector" => [Some("Technology"), None]
        )
        .unwrap();
        let snap = fundamentals_from_frame(&df).unwrap();
        assert_eq!(snap.len(), 2);
        let ko = snap.get("KO").unwrap();
        assert_eq!(ko.pe(), Some(22.0));
        assert_eq!(ko.sector, None);
        assert_eq!(ko.market_cap, None);
        assert_eq!(snap.get("AAPL").unwrap().sector.as_deref(), Some("Technology"));
    }

    #[test]
    fn history_rows_are_sorted_by_date() {
        let df = df!(
            "Date" => ["2024-01-03", "2024-01-02", "2024-01-04"],
            "AAPL" => [Some(101.0), Some(100.0), None],
            "KO" => [60.0, 59.0, 61.0]
        )
        .unwrap();
        let history = history_from_frame(&df).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(
            history.dates()[0],
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        assert_eq!(
            history.column("AAPL").unwrap(),
            &[Some(100.0), Some(101.0), None]
        );
        assert_eq!(history.column("KO").unwrap()[2], Some(61.0));
    }

    #[test]
    fn history_rejects_bad_dates_and_duplicates() {
        let bad = df!("Date" => ["2024-01-02", "yesterday"], "X" => [1.0, 2.0]).unwrap();
        assert!(matches!(
            history_from_frame(&bad),
            Err(IngestError::InvalidDate { row: 1, .. })
        ));

        let dup = df!("Date" => ["2024-01-02", "2024-01-02"], "X" => [1.0, 2.0]).unwrap();
        assert!(matches!(
            history_from_frame(&dup),
            Err(IngestError::History(HistoryError::UnsortedDates { .. }))
        ));
    }

    #[test]
    fn read_table_parses_csv_files() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Ticker,Price").unwrap();
        writeln!(file, "AAPL,190.5").unwrap();
        writeln!(file, "XYZ,").unwrap();
        file.flush().unwrap();

        let df = read_table(file.path()).unwrap();
        let rows = prices_from_frame(&df).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].price, Some(190.5));
        assert!(!rows[1].has_price());
    }

    #[test]
    fn read_table_rejects_unknown_extensions() {
        assert!(matches!(
            read_table(Path::new("prices.xlsx")),
            Err(IngestError::UnsupportedFormat(_))
        ));
    }
}
