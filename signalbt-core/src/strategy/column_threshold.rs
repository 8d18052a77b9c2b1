//! Rule-based strategy that labels bars from an upstream indicator column.
//!
//! Enter when the column rises to or above `enter_above`; exit when it falls
//! to or below `exit_below`. NaN values (indicator warm-up) produce no label.

use crate::domain::{Signal, StrategyParams};

use super::{SignalFrame, Strategy, StrategyError};

#[derive(Debug, Clone)]
pub struct ColumnThreshold {
    params: StrategyParams,
    column: String,
    enter_above: f64,
    exit_below: f64,
}

impl ColumnThreshold {
    pub fn new(
        params: StrategyParams,
        column: impl Into<String>,
        enter_above: f64,
        exit_below: f64,
    ) -> Self {
        Self {
            params,
            column: column.into(),
            enter_above,
            exit_below,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }
}

impl Strategy for ColumnThreshold {
    fn name(&self) -> &str {
        "column_threshold"
    }

    fn params(&self) -> StrategyParams {
        self.params
    }

    fn populate_indicators(&self, frame: &mut SignalFrame) -> Result<(), StrategyError> {
        frame.require_column(&self.column).map(|_| ())
    }

    /// Labels come only from the column; input labels are discarded.
    fn populate_entry_signal(&self, frame: &mut SignalFrame) -> Result<(), StrategyError> {
        frame.clear_signals();
        let hits: Vec<usize> = frame
            .require_column(&self.column)?
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v >= self.enter_above)
            .map(|(i, _)| i)
            .collect();
        for i in hits {
            frame.set_signal(i, Signal::EnterLong);
        }
        Ok(())
    }

    fn populate_exit_signal(&self, frame: &mut SignalFrame) -> Result<(), StrategyError> {
        let hits: Vec<usize> = frame
            .require_column(&self.column)?
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v <= self.exit_below)
            .map(|(i, _)| i)
            .collect();
        for i in hits {
            frame.set_signal(i, Signal::ExitLong);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use crate::strategy::prepare;
    use chrono::{Duration, NaiveDate};

    fn frame(values: Vec<f64>) -> SignalFrame {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars = (0..values.len())
            .map(|i| Bar::new(base + Duration::minutes(i as i64), 1.0, 1.0, 1.0, 1.0, 1.0))
            .collect();
        let mut f = SignalFrame::new(bars);
        f.insert_column("rsi", values).unwrap();
        f
    }

    #[test]
    fn labels_crossings_and_skips_nan() {
        let strat = ColumnThreshold::new(StrategyParams::new(100.0, 0.1, 0.2), "rsi", 70.0, 30.0);
        let out = prepare(&strat, frame(vec![f64::NAN, 75.0, 50.0, 30.0, 20.0])).unwrap();
        let signals: Vec<Option<Signal>> = out.bars().iter().map(|b| b.signal).collect();
        assert_eq!(
            signals,
            vec![
                None,
                Some(Signal::EnterLong),
                None,
                Some(Signal::ExitLong),
                Some(Signal::ExitLong),
            ]
        );
    }

    #[test]
    fn input_labels_are_discarded() {
        let strat = ColumnThreshold::new(StrategyParams::new(100.0, 0.1, 0.2), "rsi", 70.0, 30.0);
        let mut f = frame(vec![50.0, 80.0]);
        f.set_signal(0, Signal::ExitLong);
        let out = prepare(&strat, f).unwrap();
        assert_eq!(out.bars()[0].signal, None);
        assert_eq!(out.bars()[1].signal, Some(Signal::EnterLong));
    }

    #[test]
    fn missing_column_is_an_error() {
        let strat = ColumnThreshold::new(StrategyParams::new(100.0, 0.1, 0.2), "cci", 100.0, -100.0);
        let err = prepare(&strat, frame(vec![1.0])).unwrap_err();
        assert!(matches!(err, StrategyError::MissingColumn(c) if c == "cci"));
    }
}
