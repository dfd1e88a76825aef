//! Point-in-time fundamentals per ticker.
//!
//! Field names follow the provider's camelCase info keys so a raw info
//! document deserializes directly. Every metric is optional; numeric fields
//! accept numbers or numeric strings, and anything non-finite or unparsable
//! is treated as absent.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Sparse fundamentals for one ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FundamentalsRecord {
    #[serde(alias = "symbol", alias = "Ticker")]
    pub ticker: String,
    #[serde(rename = "trailingPE", deserialize_with = "lenient_f64")]
    pub trailing_pe: Option<f64>,
    #[serde(rename = "forwardPE", deserialize_with = "lenient_f64")]
    pub forward_pe: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub dividend_yield: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub beta: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub market_cap: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub average_volume: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub average_volume_10days: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub volume: Option<f64>,
    pub sector: Option<String>,
}

impl FundamentalsRecord {
    /// An empty record: every metric absent.
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Self::default()
        }
    }

    /// Average daily volume: `averageVolume`, then `averageVolume10days`, then `volume`.
    pub fn avg_volume(&self) -> Option<f64> {
        self.average_volume
            .or(self.average_volume_10days)
            .or(self.volume)
    }

    /// Price/earnings: `trailingPE`, falling back to `forwardPE`.
    pub fn pe(&self) -> Option<f64> {
        self.trailing_pe.or(self.forward_pe)
    }
}

/// Accepts a JSON number or numeric string; everything else becomes `None`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|v| v.is_finite()))
}

/// Fundamentals keyed by ticker — the right-hand side of every fundamentals join.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FundamentalsSnapshot {
    records: HashMap<String, FundamentalsRecord>,
}

impl FundamentalsSnapshot {
    /// Build a snapshot. When a ticker appears twice the first record wins,
    /// so a join can never duplicate a candidate row.
    pub fn new(records: impl IntoIterator<Item = FundamentalsRecord>) -> Self {
        let mut map = HashMap::new();
        for record in records {
            map.entry(record.ticker.clone()).or_insert(record);
        }
        Self { records: map }
    }

    /// The substitute used when the provider fails outright.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, ticker: &str) -> Option<&FundamentalsRecord> {
        self.records.get(ticker)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(|k| k.as_str())
    }
}

impl FromIterator<FundamentalsRecord> for FundamentalsSnapshot {
    fn from_iter<I: IntoIterator<Item = FundamentalsRecord>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_provider_info_document() {
        let json = r#"{
            "symbol": "KO",
            "trailingPE": 24.5,
            "forwardPE": "21.2",
            "dividendYield": 0.031,
            "beta": 0.58,
            "marketCap": 265000000000,
            "averageVolume10days": 12000000,
            "sector": "Consumer Defensive",
            "longName": "The Coca-Cola Company"
        }"#;
        let rec: FundamentalsRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.ticker, "KO");
        assert_eq!(rec.trailing_pe, Some(24.5));
        assert_eq!(rec.forward_pe, Some(21.2));
        assert_eq!(rec.average_volume, None);
        assert_eq!(rec.avg_volume(), Some(12_000_000.0));
        assert_eq!(rec.sector.as_deref(), Some("Consumer Defensive"));
    }

    #[test]
    fn non_numeric_values_are_absent() {
        let json = r#"{"trailingPE": "Infinity", "beta": null, "marketCap": "n/a"}"#;
        let rec: FundamentalsRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.trailing_pe, None);
        assert_eq!(rec.beta, None);
        assert_eq!(rec.market_cap, None);
    }

    #[test]
    fn volume_fallback_order() {
        let mut rec = FundamentalsRecord::new("A");
        rec.volume = Some(3.0);
        assert_eq!(rec.avg_volume(), Some(3.0));
        rec.average_volume_10days = Some(2.0);
        assert_eq!(rec.avg_volume(), Some(2.0));
        rec.average_volume = Some(1.0);
        assert_eq!(rec.avg_volume(), Some(1.0));
    }

    #[test]
    fn pe_falls_back_to_forward() {
        let mut rec = FundamentalsRecord::new("A");
        assert_eq!(rec.pe(), None);
        rec.forward_pe = Some(40.0);
        assert_eq!(rec.pe(), Some(40.0));
        rec.trailing_pe = Some(12.0);
        assert_eq!(rec.pe(), Some(12.0));
    }

    #[test]
    fn snapshot_first_record_wins() {
        let mut first = FundamentalsRecord::new("A");
        first.beta = Some(1.0);
        let mut second = FundamentalsRecord::new("A");
        second.beta = Some(9.0);
        let snap = FundamentalsSnapshot::new(vec![first, second]);
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.get("A").unwrap().beta, Some(1.0));
    }
}
