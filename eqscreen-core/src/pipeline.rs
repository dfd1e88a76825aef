//! Pipeline orchestrator — applies the configured stage order to a priced
//! universe.
//!
//! States: `Running` → `EmptyTerminated` | `Completed`.
//!
//! For each name in the order the orchestrator looks the stage up in its
//! registry, binds the datasets the stage declares it needs, applies it, and
//! then drops every row without a usable price. The run stops as soon as the
//! candidate set is empty. An unknown name is logged and skipped; a stage whose
//! dataset is unavailable for the whole run is skipped and recorded as such.

use serde::{Deserialize, Serialize};

use crate::config::ScreenerConfig;
use crate::domain::{CandidateSet, FundamentalsSnapshot, PriceHistory};
use crate::filter::{DataNeeds, StageInputs, StageRegistry};

/// Lifecycle of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Running,
    /// The candidate set emptied; remaining stages were not run.
    EmptyTerminated,
    /// Every configured stage ran and candidates remain.
    Completed,
}

/// What happened to one configured stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Applied,
    /// The stage needs a dataset that is absent for this run; the set passed through.
    DependencyUnavailable,
    /// No stage is registered under this name.
    Unknown,
}

/// One entry of the stage trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: String,
    pub status: StageStatus,
    pub rows_before: usize,
    /// Rows after the stage and the price re-check.
    pub rows_after: usize,
    /// Rows removed by the price re-check that followed the stage.
    pub unpriced_dropped: usize,
}

impl StageReport {
    pub fn removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub candidates: CandidateSet,
    pub state: PipelineState,
    pub trace: Vec<StageReport>,
    /// Stage after which the set emptied. `None` when the input was already
    /// empty or the run completed.
    pub terminated_after: Option<String>,
}

impl PipelineOutcome {
    pub fn is_empty_terminated(&self) -> bool {
        self.state == PipelineState::EmptyTerminated
    }
}

/// Ordered stage names plus the registry they resolve against.
#[derive(Debug)]
pub struct Pipeline {
    order: Vec<String>,
    registry: StageRegistry,
}

impl Pipeline {
    pub fn new(order: Vec<String>, registry: StageRegistry) -> Self {
        Self { order, registry }
    }

    /// Built-in stages parameterised from `config.filters`, in `config.pipeline.order`.
    pub fn from_config(config: &ScreenerConfig) -> Self {
        Self::new(
            config.pipeline.order.clone(),
            StageRegistry::from_settings(&config.filters),
        )
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    /// Datasets the recognised stages of the order need.
    pub fn required_data(&self) -> DataNeeds {
        self.registry.needs_for(&self.order)
    }

    /// Names in the order that no registered stage answers to.
    pub fn unknown_stages(&self) -> Vec<&str> {
        self.order
            .iter()
            .map(String::as_str)
            .filter(|name| !self.registry.contains(name))
            .collect()
    }

    /// Run every configured stage over `candidates`.
    ///
    /// `None` for a dataset means it is unavailable for the whole run; stages
    /// that need it pass the set through unchanged.
    pub fn run(
        &self,
        candidates: CandidateSet,
        fundamentals: Option<&FundamentalsSnapshot>,
        history: Option<&PriceHistory>,
    ) -> PipelineOutcome {
        let inputs = StageInputs::new(fundamentals, history);
        let mut current = candidates;
        let mut trace = Vec::with_capacity(self.order.len());
        let mut state = PipelineState::Running;
        let mut terminated_after = None;

        if current.is_empty() {
            tracing::info!("empty universe, no stages run");
            state = PipelineState::EmptyTerminated;
        }

        for name in &self.order {
            if state != PipelineState::Running {
                break;
            }

            let rows_before = current.len();
            let status = match self.registry.get(name) {
                None => {
                    tracing::warn!(stage = %name, "unknown stage, skipping");
                    StageStatus::Unknown
                }
                Some(stage) if !stage.needs().satisfied_by(&inputs) => {
                    tracing::warn!(
                        stage = %name,
                        "required dataset unavailable, stage passes candidates through"
                    );
                    StageStatus::DependencyUnavailable
                }
                Some(stage) => {
                    current = stage.apply(&current, &inputs);
                    StageStatus::Applied
                }
            };

            let unpriced_dropped = current.drop_unpriced();
            if unpriced_dropped > 0 {
                tracing::debug!(stage = %name, unpriced_dropped, "dropped rows without a price");
            }

            let rows_after = current.len();
            tracing::info!(stage = %name, ?status, rows_before, rows_after, "stage done");
            trace.push(StageReport {
                stage: name.clone(),
                status,
                rows_before,
                rows_after,
                unpriced_dropped,
            });

            if current.is_empty() {
                tracing::info!(stage = %name, "no candidates left, stopping early");
                state = PipelineState::EmptyTerminated;
                terminated_after = Some(name.clone());
            }
        }

        if state == PipelineState::Running {
            state = PipelineState::Completed;
        }

        PipelineOutcome {
            candidates: current,
            state,
            trace,
            terminated_after,
        }
    }
}
