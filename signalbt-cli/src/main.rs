//! SignalBT CLI — run, validate, and show commands.
//!
//! Commands:
//! - `run` — execute a backtest from a TOML config file and print the results table
//! - `validate` — validate a config and check that its data loads
//! - `show` — print the results table of a previously saved JSON result

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use signalbt_runner::data_loader::load_frame;
use signalbt_runner::export::{export_trades_csv, load_json, render_table, save_json};
use signalbt_runner::runner::run_single_backtest;
use signalbt_runner::{BacktestConfig, BacktestResult};

#[derive(Parser)]
#[command(
    name = "signalbt",
    about = "SignalBT CLI — signal-driven long-only backtester"
)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Write the full result as JSON to this path.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write the trade list as CSV to this path.
        #[arg(long)]
        trades: Option<PathBuf>,
    },
    /// Validate a config file and load its data.
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
    /// Print the results table of a saved JSON result.
    Show {
        #[arg(long)]
        json: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            json,
            trades,
        } => run_backtest_cmd(&config, json.as_deref(), trades.as_deref()),
        Commands::Validate { config } => run_validate(&config),
        Commands::Show { json } => {
            let result = load_json(&json)?;
            print_summary(&result);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn run_backtest_cmd(config_path: &Path, json: Option<&Path>, trades: Option<&Path>) -> Result<()> {
    let config = BacktestConfig::load(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;

    let result = run_single_backtest(&config)?;
    print_summary(&result);

    if let Some(path) = json {
        save_json(&result, path)?;
        info!(path = %path.display(), "result saved");
    }
    if let Some(path) = trades {
        let csv = export_trades_csv(&result.trades)?;
        std::fs::write(path, csv)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), trades = result.trades.len(), "trades saved");
    }

    Ok(())
}

fn run_validate(config_path: &Path) -> Result<()> {
    let config = BacktestConfig::load(config_path)
        .with_context(|| format!("invalid config {}", config_path.display()))?;
    let loaded = load_frame(&config.backtest.data, &config.window()?)?;
    let strategy = config.build_strategy();
    println!(
        "Config OK: strategy={} data={} rows={} in_window={} hash={}",
        strategy.name(),
        config.backtest.data.display(),
        loaded.rows_read,
        loaded.frame.len(),
        loaded.dataset_hash
    );
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let period = match (result.first_bar, result.last_bar) {
        (Some(first), Some(last)) => format!(
            "{} to {}",
            first.format("%Y/%m/%d-%H:%M"),
            last.format("%Y/%m/%d-%H:%M")
        ),
        _ => "no bars".to_string(),
    };
    println!(
        "Strategy: {}  Bars: {}  Period: {}",
        result.strategy, result.bar_count, period
    );
    print!("{}", render_table(&result.metrics));
}
