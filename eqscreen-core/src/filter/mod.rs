//! Filter stages — the screening rules applied by the pipeline.
//!
//! Every rule implements [`Stage`]: a pure function from a candidate set (plus
//! whatever external datasets it declares it needs) to a narrower candidate
//! set. Stages join against fundamentals or history by ticker lookup, so no
//! auxiliary columns ever leak into the candidate set.

pub mod beta;
pub mod dividend;
pub mod factory;
pub mod marketcap;
pub mod momentum;
pub mod pe;
pub mod price;
pub mod sector;
pub mod volatility;
pub mod volume;

use crate::domain::{CandidateSet, FundamentalsSnapshot, PriceHistory};
use serde::{Deserialize, Serialize};

/// External datasets a stage reads.
///
/// The orchestrator uses this to bind inputs and to tell when a stage's data
/// is globally unavailable; the runner uses the union over the configured
/// order to decide what to fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataNeeds {
    pub fundamentals: bool,
    pub history: bool,
}

impl DataNeeds {
    pub const NONE: Self = Self {
        fundamentals: false,
        history: false,
    };
    pub const FUNDAMENTALS: Self = Self {
        fundamentals: true,
        history: false,
    };
    pub const HISTORY: Self = Self {
        fundamentals: false,
        history: true,
    };

    pub fn union(self, other: Self) -> Self {
        Self {
            fundamentals: self.fundamentals || other.fundamentals,
            history: self.history || other.history,
        }
    }

    /// True when every dataset this descriptor names is present in `inputs`.
    pub fn satisfied_by(&self, inputs: &StageInputs<'_>) -> bool {
        (!self.fundamentals || inputs.fundamentals.is_some())
            && (!self.history || inputs.history.is_some())
    }

    pub fn is_empty(&self) -> bool {
        !self.fundamentals && !self.history
    }
}

/// Read-only external datasets available to a stage. `None` means the
/// dataset is unavailable for the whole run.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageInputs<'a> {
    pub fundamentals: Option<&'a FundamentalsSnapshot>,
    pub history: Option<&'a PriceHistory>,
}

impl<'a> StageInputs<'a> {
    pub fn new(
        fundamentals: Option<&'a FundamentalsSnapshot>,
        history: Option<&'a PriceHistory>,
    ) -> Self {
        Self {
            fundamentals,
            history,
        }
    }
}

/// Trait for screening stages.
///
/// # Contract
/// - Returns the input unchanged when a required dataset is `None`.
/// - Never mutates its inputs.
/// - Only removes rows; survivors keep their input order.
/// - Idempotent: applying a stage to its own output changes nothing.
pub trait Stage: Send + Sync {
    /// Stage identifier as used in the pipeline order (e.g., "price", "beta").
    fn name(&self) -> &str;

    /// Datasets this stage reads.
    fn needs(&self) -> DataNeeds;

    fn apply(&self, candidates: &CandidateSet, inputs: &StageInputs<'_>) -> CandidateSet;
}

// Re-export concrete stage types.
pub use beta::BetaFilter;
pub use dividend::DividendFilter;
pub use factory::{create_stage, FactoryError, StageRegistry, STAGE_NAMES};
pub use marketcap::MarketCapFilter;
pub use momentum::MomentumFilter;
pub use pe::PeFilter;
pub use price::PriceFilter;
pub use sector::SectorFilter;
pub use volatility::VolatilityFilter;
pub use volume::VolumeFilter;
