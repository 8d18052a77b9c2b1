//! Model-backed strategy: features, then predictions, then signals.
//!
//! Inference is an external collaborator behind the [`Predictor`] trait. The
//! default [`ColumnPredictor`] reads model output that was written onto the
//! input as a `predicted` column. A prediction of `1` labels an entry and
//! `-1` labels an exit.

use crate::domain::{Signal, StrategyParams};
use tracing::debug;

use super::{SignalFrame, Strategy, StrategyError};

/// Name of the column the strategy writes predictions into.
pub const PREDICTED_COLUMN: &str = "predicted";

/// Produces one prediction per row of the frame.
pub trait Predictor: Send + Sync {
    fn predict(&self, frame: &SignalFrame) -> Result<Vec<f64>, StrategyError>;
}

/// Reads precomputed predictions from a named column.
#[derive(Debug, Clone)]
pub struct ColumnPredictor {
    column: String,
}

impl ColumnPredictor {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Default for ColumnPredictor {
    fn default() -> Self {
        Self::new(PREDICTED_COLUMN)
    }
}

impl Predictor for ColumnPredictor {
    fn predict(&self, frame: &SignalFrame) -> Result<Vec<f64>, StrategyError> {
        Ok(frame.require_column(&self.column)?.to_vec())
    }
}

pub struct PredictionStrategy {
    params: StrategyParams,
    /// Leading rows whose features are still warming up; dropped before inference.
    start_up_candle_count: usize,
    predictor: Box<dyn Predictor>,
}

impl PredictionStrategy {
    pub fn new(
        params: StrategyParams,
        start_up_candle_count: usize,
        predictor: Box<dyn Predictor>,
    ) -> Self {
        Self {
            params,
            start_up_candle_count,
            predictor,
        }
    }

    /// Strategy reading predictions from the input's `predicted` column.
    pub fn from_column(params: StrategyParams, start_up_candle_count: usize) -> Self {
        Self::new(
            params,
            start_up_candle_count,
            Box::new(ColumnPredictor::default()),
        )
    }

    fn label_where(&self, frame: &mut SignalFrame, target: f64, signal: Signal) -> Result<(), StrategyError> {
        let hits: Vec<usize> = frame
            .require_column(PREDICTED_COLUMN)?
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p == target)
            .map(|(i, _)| i)
            .collect();
        for i in hits {
            frame.set_signal(i, signal);
        }
        Ok(())
    }
}

impl Strategy for PredictionStrategy {
    fn name(&self) -> &str {
        "prediction"
    }

    fn params(&self) -> StrategyParams {
        self.params
    }

    fn ai_enabled(&self) -> bool {
        true
    }

    fn populate_features(&self, frame: &mut SignalFrame) -> Result<(), StrategyError> {
        debug!(rows = self.start_up_candle_count, "dropping start-up candles");
        frame.drop_head(self.start_up_candle_count);
        Ok(())
    }

    fn populate_predictions(&self, frame: &mut SignalFrame) -> Result<(), StrategyError> {
        let predictions = self.predictor.predict(frame)?;
        frame.insert_column(PREDICTED_COLUMN, predictions)
    }

    /// Labels come only from predictions; input labels are discarded.
    fn populate_entry_signal(&self, frame: &mut SignalFrame) -> Result<(), StrategyError> {
        frame.clear_signals();
        self.label_where(frame, 1.0, Signal::EnterLong)
    }

    fn populate_exit_signal(&self, frame: &mut SignalFrame) -> Result<(), StrategyError> {
        self.label_where(frame, -1.0, Signal::ExitLong)
    }
}
