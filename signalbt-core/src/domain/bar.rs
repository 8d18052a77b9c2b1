//! Bar — the fundamental market data unit, with its optional trading signal.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Strategy-generated trade action attached to a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    EnterLong,
    ExitLong,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnterLong => "enter_long",
            Self::ExitLong => "exit_long",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown signal label '{0}' (expected enter_long or exit_long)")]
pub struct SignalParseError(pub String);

impl FromStr for Signal {
    type Err = SignalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "enter_long" => Ok(Self::EnterLong),
            "exit_long" => Ok(Self::ExitLong),
            other => Err(SignalParseError(other.to_string())),
        }
    }
}

/// One timestamped OHLCV observation.
///
/// Bars are produced upstream (loader + strategy pipeline) and are immutable
/// once the engine starts folding over them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub signal: Option<Signal>,
}

impl Bar {
    pub fn new(
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            signal: None,
        }
    }

    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_bar() -> Bar {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        Bar::new(ts, 100.0, 105.0, 98.0, 103.0, 50_000.0)
    }

    #[test]
    fn signal_parses_labels() {
        assert_eq!("enter_long".parse::<Signal>().unwrap(), Signal::EnterLong);
        assert_eq!(" exit_long ".parse::<Signal>().unwrap(), Signal::ExitLong);
        assert!("enter_short".parse::<Signal>().is_err());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        assert!(!bar.is_void());
        bar.close = f64::NAN;
        assert!(bar.is_void());
    }

    #[test]
    fn bar_serializes_signal_as_snake_case() {
        let bar = sample_bar().with_signal(Signal::EnterLong);
        let json = serde_json::to_string(&bar).unwrap();
        assert!(json.contains("\"enter_long\""));
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(deser, bar);
    }
}
