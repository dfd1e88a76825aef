//! Screen runner — wires together sources, pipeline, and allocation.
//!
//! Two entry points:
//! - `run_screen()`: loads the universe and fetches inputs from `ScreenSources`. Used by the CLI.
//! - `screen_from_inputs()`: takes already-fetched inputs. No I/O; used by tests and benches.

use chrono::{DateTime, Utc};
use thiserror::Error;

use eqscreen_core::allocation::{allocate, summary_stats, AllocationResult, SummaryStats};
use eqscreen_core::config::{ConfigError, ScreenerConfig};
use eqscreen_core::filter::DataNeeds;
use eqscreen_core::pipeline::{Pipeline, PipelineOutcome};

use crate::fetch::{fetch_inputs, MarketInputs, ScreenSources};
use crate::sources::SourceError;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("loading universe: {0}")]
    Universe(#[source] SourceError),
    #[error("fetching prices: {0}")]
    Prices(#[source] SourceError),
}

/// Complete result of one screening run.
#[derive(Debug, Clone)]
pub struct ScreenResult {
    pub config: ScreenerConfig,
    pub config_fingerprint: String,
    pub generated_at: DateTime<Utc>,
    /// Symbols in the loaded universe.
    pub universe_size: usize,
    /// Symbols with a usable latest price.
    pub priced_count: usize,
    pub required: DataNeeds,
    pub fundamentals_available: bool,
    pub history_available: bool,
    pub outcome: PipelineOutcome,
    pub allocation: AllocationResult,
    pub summary: SummaryStats,
    pub sources: Vec<String>,
    pub synthetic: bool,
    pub warnings: Vec<String>,
}

impl ScreenResult {
    /// True when at least one candidate survived every stage.
    pub fn has_survivors(&self) -> bool {
        !self.allocation.is_empty()
    }
}

/// Validate the config, load the universe, fetch what the stage order needs,
/// run the pipeline and allocate.
pub fn run_screen(config: &ScreenerConfig, sources: &ScreenSources) -> Result<ScreenResult, RunError> {
    config.validate()?;
    let pipeline = Pipeline::from_config(config);
    for name in pipeline.unknown_stages() {
        tracing::warn!(stage = name, "configured stage is not recognised and will be skipped");
    }

    let symbols = sources.universe.symbols().map_err(RunError::Universe)?;
    tracing::info!(symbols = symbols.len(), source = sources.universe.name(), "universe loaded");

    let required = pipeline.required_data();
    let inputs = fetch_inputs(sources, &symbols, required, config.data.history_lookback_days)
        .map_err(RunError::Prices)?;

    let mut result = execute(config, &pipeline, symbols.len(), inputs)?;
    result.sources = sources.describe();
    result.synthetic = sources.synthetic;
    if result.synthetic {
        result
            .warnings
            .push("synthetic data: results are not based on market data".into());
    }
    Ok(result)
}

/// Run the pipeline and allocation over pre-fetched inputs — no I/O.
pub fn screen_from_inputs(
    config: &ScreenerConfig,
    universe_size: usize,
    inputs: MarketInputs,
) -> Result<ScreenResult, RunError> {
    config.validate()?;
    let pipeline = Pipeline::from_config(config);
    execute(config, &pipeline, universe_size, inputs)
}

fn execute(
    config: &ScreenerConfig,
    pipeline: &Pipeline,
    universe_size: usize,
    inputs: MarketInputs,
) -> Result<ScreenResult, RunError> {
    let MarketInputs {
        candidates,
        fundamentals,
        history,
        warnings,
    } = inputs;
    let priced_count = candidates.len();

    let outcome = pipeline.run(candidates, fundamentals.as_ref(), history.as_ref());
    if outcome.is_empty_terminated() {
        tracing::warn!(
            after = outcome.terminated_after.as_deref().unwrap_or("<input>"),
            "no candidates survived filtering"
        );
    }

    let allocation = allocate(
        &outcome.candidates,
        config.portfolio.size,
        config.portfolio.allow_fractional,
    );
    let summary = summary_stats(&allocation, config.portfolio.size);
    tracing::info!(
        n_stocks = summary.n_stocks,
        invested = summary.invested,
        remaining_cash = summary.remaining_cash,
        "allocation complete"
    );

    Ok(ScreenResult {
        config: config.clone(),
        config_fingerprint: config.fingerprint()?,
        generated_at: Utc::now(),
        universe_size,
        priced_count,
        required: pipeline.required_data(),
        fundamentals_available: fundamentals.is_some(),
        history_available: history.is_some(),
        outcome,
        allocation,
        summary,
        sources: Vec::new(),
        synthetic: false,
        warnings,
    })
}
