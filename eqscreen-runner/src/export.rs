//! Reporting and export — CSV, JSON, and Markdown artifact generation.
//!
//! Provides three export formats for screening results:
//! - **CSV**: the allocation table (`Ticker, Price, Weight, Dollar_Allocation, Shares`)
//! - **JSON**: the full run report, round-trippable, with schema versioning
//! - **Markdown**: a human-readable summary of settings, stage trace and holdings
//!
//! Persisted reports carry a `schema_version` field. Unknown future versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eqscreen_core::allocation::{AllocationResult, SummaryStats};
use eqscreen_core::config::ScreenerConfig;
use eqscreen_core::filter::DataNeeds;
use eqscreen_core::pipeline::{PipelineState, StageReport};

use crate::screen::ScreenResult;

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Header of the allocation table, in column order.
pub const ALLOCATION_COLUMNS: [&str; 5] = ["Ticker", "Price", "Weight", "Dollar_Allocation", "Shares"];

/// Serializable record of one screening run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub config_fingerprint: String,
    pub config: ScreenerConfig,
    pub universe_size: usize,
    pub priced_count: usize,
    pub required: DataNeeds,
    pub fundamentals_available: bool,
    pub history_available: bool,
    pub state: PipelineState,
    pub terminated_after: Option<String>,
    pub trace: Vec<StageReport>,
    pub allocation: AllocationResult,
    pub summary: SummaryStats,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub synthetic: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Default schema version for older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl From<&ScreenResult> for RunReport {
    fn from(r: &ScreenResult) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: r.generated_at,
            config_fingerprint: r.config_fingerprint.clone(),
            config: r.config.clone(),
            universe_size: r.universe_size,
            priced_count: r.priced_count,
            required: r.required,
            fundamentals_available: r.fundamentals_available,
            history_available: r.history_available,
            state: r.outcome.state,
            terminated_after: r.outcome.terminated_after.clone(),
            trace: r.outcome.trace.clone(),
            allocation: r.allocation.clone(),
            summary: r.summary,
            sources: r.sources.clone(),
            synthetic: r.synthetic,
            warnings: r.warnings.clone(),
        }
    }
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the allocation table as CSV. An empty allocation yields the header only.
///
/// Numbers are written at full precision, so parsing a field back yields the
/// same `f64` that was allocated.
pub fn export_allocation_csv(allocation: &AllocationResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(ALLOCATION_COLUMNS)?;

    for row in allocation.rows() {
        wtr.write_record([
            row.ticker.clone(),
            row.price.to_string(),
            row.weight.to_string(),
            row.dollar_allocation.to_string(),
            row.shares.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn format_shares(shares: f64) -> String {
    if shares.fract() == 0.0 {
        format!("{shares:.0}")
    } else {
        format!("{shares:.6}")
    }
}

/// Write the allocation table to `path`, creating parent directories.
pub fn write_allocation_csv(allocation: &AllocationResult, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let csv = export_allocation_csv(allocation)?;
    std::fs::write(path, csv)
        .with_context(|| format!("failed to write allocation to {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = allocation.len(), "saved allocation");
    Ok(())
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunReport` to pretty JSON.
pub fn export_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize RunReport to JSON")
}

/// Deserialize a `RunReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunReport> {
    let report: RunReport =
        serde_json::from_str(json).context("failed to deserialize RunReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for a screening run.
pub fn generate_report(report: &RunReport) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Equal-Weight Screen Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Generated | {} |\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!("| Config Fingerprint | {} |\n", report.config_fingerprint));
    md.push_str(&format!("| Universe | {} symbols |\n", report.universe_size));
    md.push_str(&format!("| Priced | {} |\n", report.priced_count));
    md.push_str(&format!(
        "| Fundamentals | {} |\n",
        availability(report.required.fundamentals, report.fundamentals_available)
    ));
    md.push_str(&format!(
        "| History | {} |\n",
        availability(report.required.history, report.history_available)
    ));
    if report.synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    let p = &report.config.portfolio;
    md.push_str("## Settings\n\n");
    md.push_str(&format!("- Portfolio size: ${:.2}\n", p.size));
    md.push_str(&format!(
        "- Shares: {}\n",
        if p.allow_fractional { "fractional" } else { "whole" }
    ));
    md.push_str(&format!(
        "- Stage order: {}\n\n",
        report.config.pipeline.order.join(" → ")
    ));

    md.push_str("## Stage Trace\n\n");
    if report.trace.is_empty() {
        md.push_str("No stages ran (empty universe).\n\n");
    } else {
        md.push_str("| Stage | Status | Before | After | Removed |\n");
        md.push_str("| --- | --- | ---: | ---: | ---: |\n");
        for s in &report.trace {
            md.push_str(&format!(
                "| {} | {:?} | {} | {} | {} |\n",
                s.stage,
                s.status,
                s.rows_before,
                s.rows_after,
                s.removed()
            ));
        }
        md.push('\n');
    }
    if let Some(stage) = &report.terminated_after {
        md.push_str(&format!("Stopped early: no candidates left after `{stage}`.\n\n"));
    }

    let s = &report.summary;
    md.push_str("## Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Stocks | {} |\n", s.n_stocks));
    md.push_str(&format!("| Invested | ${:.2} |\n", s.invested));
    md.push_str(&format!("| Remaining Cash | ${:.2} |\n", s.remaining_cash));
    md.push_str(&format!("| Total Portfolio | ${:.2} |\n", s.total_portfolio));
    md.push('\n');

    if !report.allocation.is_empty() {
        md.push_str("## Holdings\n\n");
        md.push_str("| Ticker | Price | Weight | Dollar Allocation | Shares |\n");
        md.push_str("| --- | ---: | ---: | ---: | ---: |\n");
        for row in report.allocation.rows() {
            md.push_str(&format!(
                "| {} | {:.2} | {:.2}% | {:.2} | {} |\n",
                row.ticker,
                row.price,
                row.weight * 100.0,
                row.dollar_allocation,
                format_shares(row.shares)
            ));
        }
        md.push('\n');
    }

    if !report.warnings.is_empty() {
        md.push_str("## Warnings\n\n");
        for w in &report.warnings {
            md.push_str(&format!("- {w}\n"));
        }
        md.push('\n');
    }

    md
}

fn availability(required: bool, available: bool) -> &'static str {
    match (required, available) {
        (false, _) => "not needed",
        (true, true) => "available",
        (true, false) => "unavailable",
    }
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a screening run.
///
/// Creates a directory named `screen_{timestamp}/` under `output_dir`
/// containing:
/// - `allocation.csv` — the allocation table
/// - `report.json` — the full `RunReport`
/// - `report.md` — Markdown summary
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!("screen_{}", report.generated_at.format("%Y%m%d_%H%M%S"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("allocation.csv"), export_allocation_csv(&report.allocation)?)?;
    std::fs::write(run_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(run_dir.join("report.md"), generate_report(report))?;

    Ok(run_dir)
}

/// Load a `RunReport` from an artifact directory's report.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<RunReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
