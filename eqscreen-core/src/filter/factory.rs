//! Stage factory and registry — converts stage names plus `FilterSettings`
//! into runtime trait objects.
//!
//! The registry is the name-to-stage lookup the pipeline dispatches through;
//! an unrecognised name is reported by the factory as `UnknownStage` and
//! handled by the pipeline as warn-and-skip.

use std::collections::HashMap;

use crate::config::FilterSettings;

use super::{
    BetaFilter, DataNeeds, DividendFilter, MarketCapFilter, MomentumFilter, PeFilter, PriceFilter,
    SectorFilter, Stage, VolatilityFilter, VolumeFilter,
};

// ─── Error type ──────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("Unknown stage: {0}")]
    UnknownStage(String),
}

/// Every built-in stage identifier.
pub const STAGE_NAMES: [&str; 9] = [
    "price",
    "volume",
    "marketcap",
    "pe",
    "dividend",
    "beta",
    "volatility",
    "momentum",
    "sector",
];

// ─── Stage factory ───────────────────────────────────────────────────

/// Create a built-in stage from its name and the parameter bundle for it.
pub fn create_stage(
    name: &str,
    settings: &FilterSettings,
) -> Result<Box<dyn Stage>, FactoryError> {
    match name {
        "price" => Ok(Box::new(PriceFilter::from_params(&settings.price))),
        "volume" => Ok(Box::new(VolumeFilter::from_params(&settings.volume))),
        "marketcap" => Ok(Box::new(MarketCapFilter::from_params(&settings.marketcap))),
        "pe" => Ok(Box::new(PeFilter::from_params(&settings.pe))),
        "dividend" => Ok(Box::new(DividendFilter::from_params(&settings.dividend))),
        "beta" => Ok(Box::new(BetaFilter::from_params(&settings.beta))),
        "volatility" => Ok(Box::new(VolatilityFilter::from_params(&settings.volatility))),
        "momentum" => Ok(Box::new(MomentumFilter::from_params(&settings.momentum))),
        "sector" => Ok(Box::new(SectorFilter::from_params(&settings.sector))),
        other => Err(FactoryError::UnknownStage(other.to_string())),
    }
}

// ─── Registry ────────────────────────────────────────────────────────

/// Name-to-stage lookup.
#[derive(Default)]
pub struct StageRegistry {
    stages: HashMap<String, Box<dyn Stage>>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in stages, parameterised from `settings`.
    pub fn from_settings(settings: &FilterSettings) -> Self {
        let mut registry = Self::new();
        for name in STAGE_NAMES {
            if let Ok(stage) = create_stage(name, settings) {
                registry.register(stage);
            }
        }
        registry
    }

    /// Add a stage under its own name, replacing any stage already registered under it.
    pub fn register(&mut self, stage: Box<dyn Stage>) {
        self.stages.insert(stage.name().to_string(), stage);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Stage> {
        self.stages.get(name).map(|s| s.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stages.contains_key(name)
    }

    /// Datasets needed by the recognised stages of `order`.
    pub fn needs_for<S: AsRef<str>>(&self, order: &[S]) -> DataNeeds {
        order
            .iter()
            .filter_map(|name| self.get(name.as_ref()))
            .fold(DataNeeds::NONE, |acc, stage| acc.union(stage.needs()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.stages.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRegistry")
            .field("stages", &self.names())
            .finish()
    }
}
