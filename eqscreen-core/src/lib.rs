//! EqScreen Core — dataset model, filter stages, pipeline orchestrator, allocation.
//!
//! This crate contains the heart of the screener:
//! - Domain types (priced universe, fundamentals snapshot, price history)
//! - The `Stage` trait and the built-in filters, looked up by name
//! - Pipeline orchestrator with early termination on an empty set
//! - Equal-weight allocation and summary statistics
//! - TOML configuration and CSV/Parquet ingestion

pub mod allocation;
pub mod config;
pub mod data;
pub mod domain;
pub mod filter;
pub mod pipeline;

pub use allocation::{allocate, summary_stats, AllocationResult, AllocationRow, SummaryStats};
pub use config::{ConfigError, ScreenerConfig};
pub use domain::{CandidateSet, FundamentalsRecord, FundamentalsSnapshot, PriceHistory, PricedTicker};
pub use filter::{DataNeeds, Stage, StageInputs, StageRegistry};
pub use pipeline::{Pipeline, PipelineOutcome, PipelineState, StageReport, StageStatus};
