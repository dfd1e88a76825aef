//! Equal-weight screen runner — data sources, fetching, orchestration, export.
//!
//! This crate builds on `eqscreen-core` to provide:
//! - Universe, price, fundamentals and history sources (files, HTTP, synthetic)
//! - Input fetching that degrades gracefully when optional data is missing
//! - A single `run_screen` entry point from config to allocation
//! - CSV, JSON and Markdown artifacts with a versioned report schema

pub mod export;
pub mod fetch;
pub mod screen;
pub mod sources;
pub mod synthetic;

pub use export::{
    export_allocation_csv, export_json, generate_report, import_json, load_artifacts,
    save_artifacts, write_allocation_csv, RunReport, SCHEMA_VERSION,
};
pub use fetch::{fetch_inputs, MarketInputs, ScreenSources};
pub use screen::{run_screen, screen_from_inputs, RunError, ScreenResult};
pub use sources::{
    parse_symbols, ConstituentsUrl, FundamentalsDir, FundamentalsSource, FundamentalsTable,
    HistorySource, HistoryTable, PriceSource, PriceTable, SourceError, SymbolFile, UniverseSource,
    DEFAULT_CONSTITUENTS_URL,
};
pub use synthetic::SyntheticMarket;
