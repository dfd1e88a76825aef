//! Screener configuration — portfolio settings, stage order, and per-stage parameters.
//!
//! Stored as TOML. Every section and field is optional; omitted values fall
//! back to the defaults below. Stage names in `[pipeline] order` are opaque
//! here: recognition happens when the pipeline runs.
//!
//! ```toml
//! [portfolio]
//! size = 100000.0
//! allow_fractional = false
//!
//! [pipeline]
//! order = ["price", "volume", "marketcap", "pe", "dividend", "beta", "volatility", "sector"]
//!
//! [filters.price]
//! min_price = 5.0
//!
//! [filters.sector]
//! exclude = ["Utilities"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::domain::TRADING_DAYS_PER_MONTH;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration for one screening run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    pub portfolio: PortfolioConfig,
    pub pipeline: PipelineConfig,
    pub filters: FilterSettings,
    pub data: DataConfig,
    pub output: OutputConfig,
}

impl ScreenerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Reject values no run can sensibly use. Unknown stage names are not
    /// checked here; the pipeline warns about and skips them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.portfolio.size;
        if !size.is_finite() || size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "portfolio.size must be a positive number, got {size}"
            )));
        }

        let price = &self.filters.price;
        if let (Some(min), Some(max)) = (price.min_price, price.max_price) {
            if min > max {
                return Err(ConfigError::Invalid(format!(
                    "filters.price.min_price ({min}) exceeds max_price ({max})"
                )));
            }
        }

        if self.filters.volatility.window_days < 2 {
            return Err(ConfigError::Invalid(format!(
                "filters.volatility.window_days must be >= 2, got {}",
                self.filters.volatility.window_days
            )));
        }

        let months = self.filters.momentum.months;
        if months == 0 || months.checked_mul(TRADING_DAYS_PER_MONTH).is_none() {
            return Err(ConfigError::Invalid(format!(
                "filters.momentum.months must be between 1 and {}, got {months}",
                usize::MAX / TRADING_DAYS_PER_MONTH
            )));
        }

        if self.data.history_lookback_days == 0 {
            return Err(ConfigError::Invalid(
                "data.history_lookback_days must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Deterministic content hash of the configuration.
    ///
    /// Two runs with identical settings share a fingerprint.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json =
            serde_json::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

/// Capital and share policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    pub size: f64,
    pub allow_fractional: bool,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            size: 100_000.0,
            allow_fractional: false,
        }
    }
}

/// Order in which stages run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub order: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            order: [
                "price",
                "volume",
                "marketcap",
                "pe",
                "dividend",
                "beta",
                "volatility",
                "sector",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Per-stage parameter bundles, one table per stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub price: PriceParams,
    pub volume: VolumeParams,
    pub marketcap: MarketCapParams,
    pub pe: PeParams,
    pub dividend: DividendParams,
    pub beta: BetaParams,
    pub volatility: VolatilityParams,
    pub momentum: MomentumParams,
    pub sector: SectorParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceParams {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl Default for PriceParams {
    fn default() -> Self {
        Self {
            min_price: Some(5.0),
            max_price: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeParams {
    pub min_avg_volume: f64,
}

impl Default for VolumeParams {
    fn default() -> Self {
        Self {
            min_avg_volume: 100_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketCapParams {
    pub min_mcap: f64,
}

impl Default for MarketCapParams {
    fn default() -> Self {
        Self { min_mcap: 1e9 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeParams {
    pub max_pe: f64,
}

impl Default for PeParams {
    fn default() -> Self {
        Self { max_pe: 50.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DividendParams {
    pub min_yield: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BetaParams {
    pub max_beta: f64,
}

impl Default for BetaParams {
    fn default() -> Self {
        Self { max_beta: 2.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityParams {
    pub window_days: usize,
    /// Maximum daily (not annualized) standard deviation of returns.
    pub max_vol: f64,
}

impl Default for VolatilityParams {
    fn default() -> Self {
        Self {
            window_days: 60,
            max_vol: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumParams {
    pub months: usize,
    pub min_return: f64,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self {
            months: 3,
            min_return: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorParams {
    /// Allow-list. `None` or an empty list means every sector is allowed.
    pub include: Option<Vec<String>>,
    pub exclude: Vec<String>,
}

/// Settings for the data collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Calendar days of price history requested from the history source.
    pub history_lookback_days: u32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            history_lookback_days: 365,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "equal_weight_filtered.csv".into(),
        }
    }
}
