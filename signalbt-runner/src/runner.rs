//! Backtest runner — wires together data loading, strategy, engine, and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads the configured CSV, then runs. Used by CLI.
//! - `run_backtest_from_frame()`: takes an already-decorated frame. No I/O.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use signalbt_core::domain::{Position, StrategyParams};
use signalbt_core::engine::{run_backtest, EngineConfig, EngineError};
use signalbt_core::metrics::Metrics;
use signalbt_core::strategy::{prepare, SignalFrame, Strategy, StrategyError};

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{load_frame, LoadError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub strategy: String,
    pub params: StrategyParams,
    pub metrics: Metrics,
    /// Every position, in entry order. All are closed.
    pub trades: Vec<Position>,
    /// Bars traded, after windowing and the strategy's start-up trim.
    pub bar_count: usize,
    pub signal_count: usize,
    pub first_bar: Option<NaiveDateTime>,
    pub last_bar: Option<NaiveDateTime>,
    pub dataset_hash: String,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run a single backtest from a `BacktestConfig`.
pub fn run_single_backtest(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let window = config.window()?;
    let loaded = load_frame(&config.backtest.data, &window)?;
    let strategy = config.build_strategy();

    run_backtest_from_frame(
        strategy.as_ref(),
        loaded.frame,
        config.backtest.starting_balance,
        &loaded.dataset_hash,
    )
}

/// Run the strategy pipeline and the engine over a pre-loaded frame.
pub fn run_backtest_from_frame(
    strategy: &dyn Strategy,
    frame: SignalFrame,
    starting_balance: f64,
    dataset_hash: &str,
) -> Result<BacktestResult, RunError> {
    let params = strategy.params();
    let bars = prepare(strategy, frame)?.into_bars();
    let engine_config = EngineConfig::new(starting_balance, params);
    let ledger = run_backtest(&bars, &engine_config)?;
    let metrics = Metrics::summarize(&ledger);

    info!(
        strategy = strategy.name(),
        bars = bars.len(),
        trades = metrics.total_trades,
        final_balance = metrics.final_balance,
        "run finished"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        strategy: strategy.name().to_string(),
        params,
        metrics,
        trades: ledger.positions().to_vec(),
        bar_count: bars.len(),
        signal_count: bars.iter().filter(|b| b.signal.is_some()).count(),
        first_bar: bars.first().map(|b| b.timestamp),
        last_bar: bars.last().map(|b| b.timestamp),
        dataset_hash: dataset_hash.to_string(),
    })
}
