//! Engine configuration.

use crate::domain::StrategyParams;
use serde::{Deserialize, Serialize};

/// Configuration for a single backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub starting_balance: f64,
    pub params: StrategyParams,
}

impl EngineConfig {
    pub fn new(starting_balance: f64, params: StrategyParams) -> Self {
        Self {
            starting_balance,
            params,
        }
    }
}
