//! Strategy parameters consumed read-only by the engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamsError {
    #[error("stake_amount must be a finite number > 0, got {0}")]
    StakeAmount(f64),
    #[error("stop_loss must be in (0, 1], got {0}")]
    StopLoss(f64),
    #[error("take_profit must be a finite number > 0, got {0}")]
    TakeProfit(f64),
}

/// Per-trade sizing and exit thresholds.
///
/// `stop_loss` and `take_profit` are fractions of the stake: 0.1 closes a
/// position once it has lost (or gained) 10% of `stake_amount`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    pub stake_amount: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl StrategyParams {
    pub fn new(stake_amount: f64, stop_loss: f64, take_profit: f64) -> Self {
        Self {
            stake_amount,
            stop_loss,
            take_profit,
        }
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(self.stake_amount.is_finite() && self.stake_amount > 0.0) {
            return Err(ParamsError::StakeAmount(self.stake_amount));
        }
        if !(self.stop_loss > 0.0 && self.stop_loss <= 1.0) {
            return Err(ParamsError::StopLoss(self.stop_loss));
        }
        if !(self.take_profit.is_finite() && self.take_profit > 0.0) {
            return Err(ParamsError::TakeProfit(self.take_profit));
        }
        Ok(())
    }
}
