//! Fetch market inputs with graceful degradation.
//!
//! Ordering and substitution rules:
//! 1. Empty symbol list → nothing is fetched.
//! 2. Prices: a failure aborts the run. No priced symbols → stop here.
//! 3. Fundamentals, only if an ordered stage needs them. No source → `None`;
//!    a failing source → warning plus an empty snapshot, so fundamentals
//!    stages exclude every row rather than pass them all.
//! 4. History, only if an ordered stage needs it. No source or a failing
//!    source → warning plus `None`, so history stages pass rows through.

use eqscreen_core::domain::{CandidateSet, FundamentalsSnapshot, PriceHistory};
use eqscreen_core::filter::DataNeeds;

use crate::sources::{
    FundamentalsSource, HistorySource, PriceSource, SourceError, UniverseSource,
};
use crate::synthetic::SyntheticMarket;

/// The set of collaborators a screening run reads from.
pub struct ScreenSources {
    pub universe: Box<dyn UniverseSource>,
    pub prices: Box<dyn PriceSource>,
    pub fundamentals: Option<Box<dyn FundamentalsSource>>,
    pub history: Option<Box<dyn HistorySource>>,
    /// True when any collaborator produces fabricated data.
    pub synthetic: bool,
}

impl ScreenSources {
    pub fn new(universe: Box<dyn UniverseSource>, prices: Box<dyn PriceSource>) -> Self {
        Self {
            universe,
            prices,
            fundamentals: None,
            history: None,
            synthetic: false,
        }
    }

    pub fn with_fundamentals(mut self, source: Box<dyn FundamentalsSource>) -> Self {
        self.fundamentals = Some(source);
        self
    }

    pub fn with_history(mut self, source: Box<dyn HistorySource>) -> Self {
        self.history = Some(source);
        self
    }

    /// Every collaborator backed by the same synthetic market.
    pub fn synthetic(market: SyntheticMarket) -> Self {
        Self {
            universe: Box::new(market.clone()),
            prices: Box::new(market.clone()),
            fundamentals: Some(Box::new(market.clone())),
            history: Some(Box::new(market)),
            synthetic: true,
        }
    }

    /// Names of the configured collaborators, for reports.
    pub fn describe(&self) -> Vec<String> {
        let mut names = vec![
            format!("universe={}", self.universe.name()),
            format!("prices={}", self.prices.name()),
        ];
        if let Some(f) = &self.fundamentals {
            names.push(format!("fundamentals={}", f.name()));
        }
        if let Some(h) = &self.history {
            names.push(format!("history={}", h.name()));
        }
        names
    }
}

impl std::fmt::Debug for ScreenSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenSources")
            .field("sources", &self.describe())
            .field("synthetic", &self.synthetic)
            .finish()
    }
}

/// Datasets handed to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct MarketInputs {
    pub candidates: CandidateSet,
    pub fundamentals: Option<FundamentalsSnapshot>,
    pub history: Option<PriceHistory>,
    /// Degradations that happened while fetching.
    pub warnings: Vec<String>,
}

/// Fetch prices, then whichever optional datasets `required` names.
///
/// Only a price failure is an error.
pub fn fetch_inputs(
    sources: &ScreenSources,
    symbols: &[String],
    required: DataNeeds,
    lookback_days: u32,
) -> Result<MarketInputs, SourceError> {
    let mut inputs = MarketInputs::default();
    if symbols.is_empty() {
        tracing::info!("empty universe, skipping all fetches");
        return Ok(inputs);
    }

    tracing::info!(symbols = symbols.len(), source = sources.prices.name(), "fetching latest prices");
    inputs.candidates = CandidateSet::new(sources.prices.latest_prices(symbols)?);
    inputs.candidates.drop_unpriced();
    tracing::info!(priced = inputs.candidates.len(), "prices fetched");
    if inputs.candidates.is_empty() {
        return Ok(inputs);
    }

    let tickers: Vec<String> = inputs
        .candidates
        .iter()
        .map(|row| row.ticker.clone())
        .collect();

    if required.fundamentals {
        inputs.fundamentals = match &sources.fundamentals {
            None => {
                inputs.warn("no fundamentals source configured; fundamentals stages pass through");
                None
            }
            Some(source) => match source.fundamentals(&tickers) {
                Ok(snapshot) => {
                    tracing::info!(records = snapshot.len(), "fundamentals fetched");
                    Some(snapshot)
                }
                Err(e) => {
                    inputs.warn(format!(
                        "fundamentals fetch failed, continuing with an empty snapshot: {e}"
                    ));
                    Some(FundamentalsSnapshot::empty())
                }
            },
        };
    }

    if required.history {
        inputs.history = match &sources.history {
            None => {
                inputs.warn("no history source configured; history stages pass through");
                None
            }
            Some(source) => match source.history(&tickers, lookback_days) {
                Ok(history) => {
                    tracing::info!(rows = history.len(), "history fetched");
                    Some(history)
                }
                Err(e) => {
                    inputs.warn(format!("history fetch failed, continuing without it: {e}"));
                    None
                }
            },
        };
    }

    Ok(inputs)
}

impl MarketInputs {
    fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.warnings.push(message);
    }
}
