//! SignalBT Runner — backtest orchestration, data loading, reporting.
//!
//! This crate builds on `signalbt-core` to provide:
//! - TOML configuration for a single run
//! - CSV loading of decorated, signal-labeled bars with a time window
//! - Single-backtest runner producing a versioned result
//! - JSON/CSV export and the console results table

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use config::{BacktestConfig, ConfigError, StrategyKind};
pub use data_loader::{load_frame, load_frame_from_reader, LoadError, LoadedData, TimeWindow};
pub use export::{export_json, export_trades_csv, import_json, render_table};
pub use runner::{run_backtest_from_frame, run_single_backtest, BacktestResult, RunError};
