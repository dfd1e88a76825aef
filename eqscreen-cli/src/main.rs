//! EqScreen CLI — run equal-weight screens and manage config files.
//!
//! Commands:
//! - `run` — screen a universe, allocate the survivors, write the allocation table
//! - `init-config` — write a config file with every default spelled out
//! - `check-config` — validate a config and show what a run would need

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use eqscreen_core::pipeline::Pipeline;
use eqscreen_core::ScreenerConfig;
use eqscreen_runner::{
    run_screen, save_artifacts, write_allocation_csv, ConstituentsUrl, FundamentalsDir,
    FundamentalsTable, HistoryTable, PriceTable, RunReport, ScreenResult, ScreenSources,
    SymbolFile, SyntheticMarket,
};

/// Exit status when the run succeeded but nothing survived the filters.
const EXIT_NO_SURVIVORS: i32 = 2;

#[derive(Parser)]
#[command(
    name = "eqscreen",
    about = "EqScreen CLI — equity screening and equal-weight allocation"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen a universe and write the equal-weight allocation table.
    Run {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Symbol list file (CSV with a Symbol column, or one symbol per line).
        #[arg(long, conflicts_with = "constituents_url")]
        symbols: Option<PathBuf>,

        /// URL of a constituents CSV. Defaults to the S&P 500 list.
        #[arg(long)]
        constituents_url: Option<String>,

        /// Latest prices table (CSV or Parquet with Ticker and Price columns).
        #[arg(long)]
        prices: Option<PathBuf>,

        /// Fundamentals table, or a directory of per-ticker JSON documents.
        #[arg(long)]
        fundamentals: Option<PathBuf>,

        /// Wide close-price history table (Date plus one column per ticker).
        #[arg(long)]
        history: Option<PathBuf>,

        /// Use a synthetic market of this many tickers instead of real data.
        #[arg(
            long,
            value_name = "N",
            conflicts_with_all = ["symbols", "constituents_url", "prices", "fundamentals", "history"]
        )]
        synthetic: Option<usize>,

        /// Seed for the synthetic market.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Allocation CSV path. Defaults to the config's output.path.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also save allocation.csv, report.json and report.md under this directory.
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },
    /// Write a config file with every default spelled out.
    InitConfig {
        /// Destination path.
        #[arg(long, default_value = "eqscreen.toml")]
        output: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Validate a config file and show the datasets a run would fetch.
    CheckConfig {
        /// Path to the TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            symbols,
            constituents_url,
            prices,
            fundamentals,
            history,
            synthetic,
            seed,
            output,
            artifacts,
        } => {
            let sources = match synthetic {
                Some(size) => ScreenSources::synthetic(SyntheticMarket::new(size, seed)),
                None => build_sources(symbols, constituents_url, prices, fundamentals, history)?,
            };
            run_screen_cmd(config.as_deref(), &sources, output, artifacts)
        }
        Commands::InitConfig { output, force } => run_init_config(&output, force),
        Commands::CheckConfig { config } => run_check_config(&config),
    }
}

/// Logs go to stderr so stdout carries only the summary.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_sources(
    symbols: Option<PathBuf>,
    constituents_url: Option<String>,
    prices: Option<PathBuf>,
    fundamentals: Option<PathBuf>,
    history: Option<PathBuf>,
) -> Result<ScreenSources> {
    let Some(prices) = prices else {
        bail!("--prices is required unless --synthetic is given");
    };

    let universe: Box<dyn eqscreen_runner::UniverseSource> = match (symbols, constituents_url) {
        (Some(path), _) => Box::new(SymbolFile::new(path)),
        (None, Some(url)) => Box::new(ConstituentsUrl::new(url)),
        (None, None) => Box::new(ConstituentsUrl::sp500()),
    };

    let mut sources = ScreenSources::new(universe, Box::new(PriceTable::new(prices)));
    if let Some(path) = fundamentals {
        sources = if path.is_dir() {
            sources.with_fundamentals(Box::new(FundamentalsDir::new(path)))
        } else {
            sources.with_fundamentals(Box::new(FundamentalsTable::new(path)))
        };
    }
    if let Some(path) = history {
        sources = sources.with_history(Box::new(HistoryTable::new(path)));
    }
    Ok(sources)
}

fn load_config(path: Option<&Path>) -> Result<ScreenerConfig> {
    match path {
        Some(path) => ScreenerConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ScreenerConfig::default()),
    }
}

fn run_screen_cmd(
    config_path: Option<&Path>,
    sources: &ScreenSources,
    output: Option<PathBuf>,
    artifacts: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;
    tracing::debug!(sources = ?sources.describe(), order = ?config.pipeline.order, "starting screen");
    let result = run_screen(&config, sources)?;

    // The table is written even when empty so downstream tooling sees the header.
    let output = output.unwrap_or_else(|| PathBuf::from(&config.output.path));
    write_allocation_csv(&result.allocation, &output)?;

    print_summary(&result);
    println!("Allocation saved to: {}", output.display());

    if let Some(dir) = artifacts {
        let run_dir = save_artifacts(&RunReport::from(&result), &dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    if !result.has_survivors() {
        eprintln!("No candidates survived the filters.");
        std::process::exit(EXIT_NO_SURVIVORS);
    }
    Ok(())
}

fn run_init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite",
            output.display()
        );
    }
    let toml = ScreenerConfig::default().to_toml()?;
    std::fs::write(output, toml)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Wrote default config to {}", output.display());
    Ok(())
}

fn run_check_config(path: &Path) -> Result<()> {
    let config = load_config(Some(path))?;
    config.validate()?;

    let pipeline = Pipeline::from_config(&config);
    let required = pipeline.required_data();

    println!("Config OK: {}", path.display());
    println!("Fingerprint:    {}", config.fingerprint()?);
    println!("Stage order:    {}", pipeline.order().join(", "));
    println!("Fundamentals:   {}", if required.fundamentals { "required" } else { "not needed" });
    println!("History:        {}", if required.history { "required" } else { "not needed" });
    for name in pipeline.unknown_stages() {
        println!("WARNING: unknown stage '{name}' will be skipped");
    }
    Ok(())
}

fn print_summary(result: &ScreenResult) {
    let s = &result.summary;
    println!();
    println!("=== Screen Result ===");
    println!("Universe:       {} symbols", result.universe_size);
    println!("Priced:         {}", result.priced_count);
    println!("Survivors:      {}", s.n_stocks);
    if let Some(stage) = &result.outcome.terminated_after {
        println!("Stopped after:  {stage}");
    }
    println!();
    println!("--- Stages ---");
    for stage in &result.outcome.trace {
        println!(
            "{:<12} {:<22} {:>6} -> {:<6}",
            stage.stage,
            format!("{:?}", stage.status),
            stage.rows_before,
            stage.rows_after
        );
    }
    println!();
    println!("--- Allocation ---");
    println!("Invested:       ${:.2}", s.invested);
    println!("Remaining Cash: ${:.2}", s.remaining_cash);
    println!("Total:          ${:.2}", s.total_portfolio);
    if result.synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    for warn in &result.warnings {
        println!("WARNING: {warn}");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn synthetic_conflicts_with_file_sources() {
        let parsed =
            Cli::try_parse_from(["eqscreen", "run", "--synthetic", "50", "--prices", "p.csv"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn verbose_flag_is_global() {
        let cli = Cli::try_parse_from(["eqscreen", "check-config", "--config", "c.toml", "-v"])
            .unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn prices_are_required_without_synthetic() {
        let err = build_sources(None, None, None, None, None).unwrap_err();
        assert!(err.to_string().contains("--prices"));
    }

    #[test]
    fn fundamentals_directory_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let sources = build_sources(
            Some(dir.path().join("symbols.txt")),
            None,
            Some(dir.path().join("prices.csv")),
            Some(dir.path().to_path_buf()),
            None,
        )
        .unwrap();
        let described = sources.describe();
        assert!(described.contains(&"fundamentals=fundamentals-dir".to_string()));
        assert!(described.contains(&"universe=symbol-file".to_string()));
    }

    #[test]
    fn init_config_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eqscreen.toml");
        run_init_config(&path, false).unwrap();
        assert!(run_init_config(&path, false).is_err());
        run_init_config(&path, true).unwrap();

        let written = ScreenerConfig::from_file(&path).unwrap();
        assert_eq!(written, ScreenerConfig::default());
        run_check_config(&path).unwrap();
    }
}
