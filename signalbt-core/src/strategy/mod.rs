//! Strategy pipeline — turns a decorated frame into signal-labeled bars.
//!
//! A strategy is a capability set rather than a class hierarchy. Every
//! strategy populates indicators and entry/exit signals; strategies that
//! report `ai_enabled()` additionally run the feature and prediction steps
//! between the two.
//!
//! Strategies never see the ledger. They label bars; the engine trades them.

pub mod column_threshold;
pub mod frame;
pub mod prediction;
pub mod signal_column;

pub use column_threshold::ColumnThreshold;
pub use frame::SignalFrame;
pub use prediction::{ColumnPredictor, PredictionStrategy, Predictor};
pub use signal_column::SignalColumn;

use crate::domain::StrategyParams;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("required column '{0}' is not present on the frame")]
    MissingColumn(String),

    #[error("column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("prediction failed: {0}")]
    Prediction(String),
}

/// Signal-producing strategy.
pub trait Strategy: Send + Sync {
    /// Human-readable name (e.g., "signal_column").
    fn name(&self) -> &str;

    /// Sizing and exit thresholds handed to the engine.
    fn params(&self) -> StrategyParams;

    /// Whether the feature and prediction steps run.
    fn ai_enabled(&self) -> bool {
        false
    }

    fn populate_indicators(&self, _frame: &mut SignalFrame) -> Result<(), StrategyError> {
        Ok(())
    }

    fn populate_features(&self, _frame: &mut SignalFrame) -> Result<(), StrategyError> {
        Ok(())
    }

    fn populate_predictions(&self, _frame: &mut SignalFrame) -> Result<(), StrategyError> {
        Ok(())
    }

    fn populate_entry_signal(&self, frame: &mut SignalFrame) -> Result<(), StrategyError>;

    /// Runs after the entry step; an exit label overwrites an entry label.
    fn populate_exit_signal(&self, frame: &mut SignalFrame) -> Result<(), StrategyError>;
}

/// Run the full pipeline: indicators, then (if AI-enabled) features and
/// predictions, then entry and exit signals.
pub fn prepare(strategy: &dyn Strategy, mut frame: SignalFrame) -> Result<SignalFrame, StrategyError> {
    strategy.populate_indicators(&mut frame)?;
    if strategy.ai_enabled() {
        strategy.populate_features(&mut frame)?;
        strategy.populate_predictions(&mut frame)?;
    }
    strategy.populate_entry_signal(&mut frame)?;
    strategy.populate_exit_signal(&mut frame)?;

    debug!(
        strategy = strategy.name(),
        rows = frame.len(),
        "strategy pipeline complete"
    );
    Ok(frame)
}
