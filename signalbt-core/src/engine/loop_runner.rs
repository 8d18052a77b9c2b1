//! Bar-by-bar fold — the heart of the backtesting engine.
//!
//! Each bar is applied to a fresh `Ledger` via [`step`] in strict time order.
//! After the last bar every open position is liquidated at the final close,
//! so a finished ledger never holds open positions.

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::info;

use crate::domain::{Bar, Ledger, ParamsError};

use super::state::EngineConfig;
use super::step::{liquidate, step};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid strategy parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("starting balance must be a finite number >= 0, got {0}")]
    InvalidBalance(f64),

    #[error("bar {index} at {timestamp} is not after the previous bar at {previous}")]
    OutOfOrder {
        index: usize,
        timestamp: NaiveDateTime,
        previous: NaiveDateTime,
    },
}

/// Run a backtest over time-ordered bars.
///
/// Fails before touching the ledger if the configuration is invalid, and
/// fails fast on the first bar whose timestamp does not strictly follow its
/// predecessor. An empty bar slice produces an untouched ledger.
pub fn run_backtest(bars: &[Bar], config: &EngineConfig) -> Result<Ledger, EngineError> {
    config.params.validate()?;
    if !(config.starting_balance.is_finite() && config.starting_balance >= 0.0) {
        return Err(EngineError::InvalidBalance(config.starting_balance));
    }

    let mut ledger = Ledger::new(config.starting_balance);

    for (t, bar) in bars.iter().enumerate() {
        if t > 0 {
            let previous = bars[t - 1].timestamp;
            if bar.timestamp <= previous {
                return Err(EngineError::OutOfOrder {
                    index: t,
                    timestamp: bar.timestamp,
                    previous,
                });
            }
        }
        step(&mut ledger, bar, t, &config.params);
    }

    if let Some(last) = bars.last() {
        let liquidated = liquidate(&mut ledger, last, bars.len() - 1);
        info!(
            bars = bars.len(),
            trades = ledger.total_trades(),
            liquidated,
            final_balance = ledger.balance(),
            "backtest complete"
        );
    }

    Ok(ledger)
}
