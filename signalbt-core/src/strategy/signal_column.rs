//! Rule-based strategy whose signals arrive already attached to the input rows.

use crate::domain::StrategyParams;

use super::{SignalFrame, Strategy, StrategyError};

/// Pass-through strategy: the `signal` column of the input is used as-is.
#[derive(Debug, Clone)]
pub struct SignalColumn {
    params: StrategyParams,
}

impl SignalColumn {
    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }
}

impl Strategy for SignalColumn {
    fn name(&self) -> &str {
        "signal_column"
    }

    fn params(&self) -> StrategyParams {
        self.params
    }

    fn populate_entry_signal(&self, _frame: &mut SignalFrame) -> Result<(), StrategyError> {
        Ok(())
    }

    fn populate_exit_signal(&self, _frame: &mut SignalFrame) -> Result<(), StrategyError> {
        Ok(())
    }
}
