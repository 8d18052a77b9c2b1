//! Backtesting engine — a strict left-to-right fold of bars into a ledger.
//!
//! Per bar:
//! 1. Entry signal: open a stake-sized long if capital allows
//! 2. Exit signal: force-close all open positions
//! 3. Stop-loss / take-profit sweep over remaining positions
//!
//! After the last bar, remaining positions are liquidated at the final close.

pub mod loop_runner;
pub mod state;
pub mod step;

pub use loop_runner::{run_backtest, EngineError};
pub use state::EngineConfig;
pub use step::{liquidate, step, threshold_exit};
