//! SignalFrame — bars plus named numeric columns aligned to them.
//!
//! Upstream collaborators decorate the frame (indicators, features, model
//! output) before signals are derived. Every column has exactly one value per
//! bar.

use crate::domain::{Bar, Signal};
use std::collections::HashMap;

use super::StrategyError;

#[derive(Debug, Clone, Default)]
pub struct SignalFrame {
    bars: Vec<Bar>,
    columns: HashMap<String, Vec<f64>>,
}

impl SignalFrame {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self {
            bars,
            columns: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }

    /// Insert or replace a named column. Its length must match the bar count.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), StrategyError> {
        let name = name.into();
        if values.len() != self.bars.len() {
            return Err(StrategyError::LengthMismatch {
                column: name,
                expected: self.bars.len(),
                actual: values.len(),
            });
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    /// Like [`column`](Self::column) but a missing column is an error.
    pub fn require_column(&self, name: &str) -> Result<&[f64], StrategyError> {
        self.column(name)
            .ok_or_else(|| StrategyError::MissingColumn(name.to_string()))
    }

    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.columns
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    /// Column names in sorted order.
    pub fn column_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.columns.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn set_signal(&mut self, bar_index: usize, signal: Signal) {
        if let Some(bar) = self.bars.get_mut(bar_index) {
            bar.signal = Some(signal);
        }
    }

    /// Remove every signal label, e.g. ones carried in from the input.
    pub fn clear_signals(&mut self) {
        for bar in &mut self.bars {
            bar.signal = None;
        }
    }

    /// Drop the first `n` rows from the bars and every column.
    pub fn drop_head(&mut self, n: usize) {
        let n = n.min(self.bars.len());
        self.bars.drain(..n);
        for values in self.columns.values_mut() {
            values.drain(..n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn frame(n: usize) -> SignalFrame {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars = (0..n)
            .map(|i| {
                let close = 100.0 + i as f64;
                Bar::new(base + Duration::minutes(i as i64), close, close, close, close, 1.0)
            })
            .collect();
        SignalFrame::new(bars)
    }

    #[test]
    fn insert_rejects_misaligned_column() {
        let mut f = frame(3);
        let err = f.insert_column("rsi", vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            StrategyError::LengthMismatch { expected: 3, actual: 2, .. }
        ));
    }

    #[test]
    fn drop_head_keeps_columns_aligned() {
        let mut f = frame(5);
        f.insert_column("x", vec![0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
        f.drop_head(2);

        assert_eq!(f.len(), 3);
        assert_eq!(f.column("x").unwrap(), &[2.0, 3.0, 4.0]);
        assert_eq!(f.bars()[0].close, 102.0);

        f.drop_head(10);
        assert!(f.is_empty());
        assert!(f.column("x").unwrap().is_empty());
    }

    #[test]
    fn clear_signals_removes_all_labels() {
        let mut f = frame(3);
        f.set_signal(0, Signal::EnterLong);
        f.set_signal(2, Signal::ExitLong);
        f.clear_signals();
        assert!(f.bars().iter().all(|b| b.signal.is_none()));
    }

    #[test]
    fn set_signal_ignores_out_of_range() {
        let mut f = frame(2);
        f.set_signal(1, Signal::ExitLong);
        f.set_signal(7, Signal::EnterLong);
        assert_eq!(f.bars()[1].signal, Some(Signal::ExitLong));
        assert_eq!(f.bars()[0].signal, None);
    }
}
