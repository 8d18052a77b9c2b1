//! Serializable backtest configuration (TOML).
//!
//! ```toml
//! [backtest]
//! data = "bars.csv"
//! starting_balance = 1000.0
//! from = "2024/01/01-00:00"
//! to = "2024/02/01-00:00"
//!
//! [strategy]
//! kind = "prediction"
//! stake_amount = 100.0
//! stop_loss = 0.02
//! take_profit = 0.05
//! start_up_candle_count = 30
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use signalbt_core::domain::{ParamsError, StrategyParams};
use signalbt_core::strategy::{ColumnThreshold, PredictionStrategy, SignalColumn, Strategy};
use thiserror::Error;

use crate::data_loader::{parse_window_bound, TimeWindow};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid strategy parameters: {0}")]
    Params(#[from] ParamsError),

    #[error("starting_balance must be a finite number >= 0, got {0}")]
    StartingBalance(f64),

    #[error("invalid time window: {0}")]
    Window(String),

    #[error("unknown key '{key}' in [strategy] for kind '{kind}'")]
    UnknownKey { kind: String, key: String },
}

/// Complete configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub strategy: StrategySection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestSection {
    /// CSV file with the decorated, signal-labeled bars.
    pub data: PathBuf,
    pub starting_balance: f64,
    /// Inclusive window start, e.g. `2024/01/01-00:00`.
    #[serde(default)]
    pub from: Option<String>,
    /// Inclusive window end.
    #[serde(default)]
    pub to: Option<String>,
}

/// Keys are checked against [`StrategyKind::accepts_key`] when parsed through
/// [`BacktestConfig::from_toml`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySection {
    #[serde(flatten)]
    pub kind: StrategyKind,
    pub stake_amount: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Which strategy variant labels the bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyKind {
    /// Signals are already in the input's `signal` column.
    SignalColumn,
    /// Signals derived from a `predicted` column (1 = enter, -1 = exit).
    Prediction {
        #[serde(default)]
        start_up_candle_count: usize,
    },
    /// Signals derived by thresholding a decoration column.
    ColumnThreshold {
        column: String,
        enter_above: f64,
        exit_below: f64,
    },
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SignalColumn => "signal_column",
            Self::Prediction { .. } => "prediction",
            Self::ColumnThreshold { .. } => "column_threshold",
        }
    }

    /// Keys accepted in `[strategy]` for this kind.
    pub fn accepts_key(&self, key: &str) -> bool {
        const COMMON: [&str; 4] = ["kind", "stake_amount", "stop_loss", "take_profit"];
        let own: &[&str] = match self {
            Self::SignalColumn => &[],
            Self::Prediction { .. } => &["start_up_candle_count"],
            Self::ColumnThreshold { .. } => &["column", "enter_above", "exit_below"],
        };
        COMMON.contains(&key) || own.contains(&key)
    }
}

impl BacktestConfig {
    /// Parse and validate a TOML string. Relative data paths are kept as-is.
    ///
    /// Unknown keys are rejected in every section.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let raw: toml::Table = toml::from_str(content)?;
        let config: Self = toml::from_str(content)?;

        let kind = &config.strategy.kind;
        if let Some(strategy) = raw.get("strategy").and_then(|v| v.as_table()) {
            if let Some(key) = strategy.keys().find(|k| !kind.accepts_key(k)) {
                return Err(ConfigError::UnknownKey {
                    kind: kind.name().to_string(),
                    key: key.clone(),
                });
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from a file. A relative `data` path resolves against the
    /// config file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if config.backtest.data.is_relative() {
            if let Some(dir) = path.parent() {
                config.backtest.data = dir.join(&config.backtest.data);
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.params().validate()?;
        let balance = self.backtest.starting_balance;
        if !(balance.is_finite() && balance >= 0.0) {
            return Err(ConfigError::StartingBalance(balance));
        }
        self.window()?;
        Ok(())
    }

    pub fn params(&self) -> StrategyParams {
        StrategyParams::new(
            self.strategy.stake_amount,
            self.strategy.stop_loss,
            self.strategy.take_profit,
        )
    }

    /// The inclusive time window used to slice the input.
    pub fn window(&self) -> Result<TimeWindow, ConfigError> {
        let parse = |s: &Option<String>| {
            s.as_deref()
                .map(|v| parse_window_bound(v).ok_or_else(|| ConfigError::Window(v.to_string())))
                .transpose()
        };
        let window = TimeWindow {
            start: parse(&self.backtest.from)?,
            end: parse(&self.backtest.to)?,
        };
        if let (Some(start), Some(end)) = (window.start, window.end) {
            if start > end {
                return Err(ConfigError::Window(format!("from {start} is after to {end}")));
            }
        }
        Ok(window)
    }

    pub fn build_strategy(&self) -> Box<dyn Strategy> {
        let params = self.params();
        match &self.strategy.kind {
            StrategyKind::SignalColumn => Box::new(SignalColumn::new(params)),
            StrategyKind::Prediction {
                start_up_candle_count,
            } => Box::new(PredictionStrategy::from_column(params, *start_up_candle_count)),
            StrategyKind::ColumnThreshold {
                column,
                enter_above,
                exit_below,
            } => Box::new(ColumnThreshold::new(
                params,
                column.clone(),
                *enter_above,
                *exit_below,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREDICTION: &str = r#"
        [backtest]
        data = "bars.csv"
        starting_balance = 1000.0
        from = "2024/01/01-00:00"
        to = "2024/02/01-00:00"

        [strategy]
        kind = "prediction"
        stake_amount = 100.0
        stop_loss = 0.02
        take_profit = 0.05
        start_up_candle_count = 30
    "#;

    #[test]
    fn parses_prediction_config() {
        let cfg = BacktestConfig::from_toml(PREDICTION).unwrap();
        assert_eq!(
            cfg.strategy.kind,
            StrategyKind::Prediction {
                start_up_candle_count: 30
            }
        );
        assert_eq!(cfg.params(), StrategyParams::new(100.0, 0.02, 0.05));
        assert_eq!(cfg.build_strategy().name(), "prediction");

        let window = cfg.window().unwrap();
        assert!(window.start.unwrap() < window.end.unwrap());
    }

    #[test]
    fn parses_threshold_config_without_window() {
        let cfg = BacktestConfig::from_toml(
            r#"
            [backtest]
            data = "bars.csv"
            starting_balance = 500.0

            [strategy]
            kind = "column_threshold"
            column = "rsi"
            enter_above = 70.0
            exit_below = 30.0
            stake_amount = 50.0
            stop_loss = 0.1
            take_profit = 0.2
            "#,
        )
        .unwrap();
        assert_eq!(cfg.build_strategy().name(), "column_threshold");
        assert_eq!(cfg.window().unwrap(), TimeWindow::default());
    }

    #[test]
    fn rejects_bad_params() {
        let bad = PREDICTION.replace("stop_loss = 0.02", "stop_loss = 1.5");
        assert!(matches!(
            BacktestConfig::from_toml(&bad),
            Err(ConfigError::Params(ParamsError::StopLoss(_)))
        ));
    }

    #[test]
    fn rejects_inverted_window() {
        let bad = PREDICTION.replace("2024/02/01-00:00", "2023/02/01-00:00");
        assert!(matches!(
            BacktestConfig::from_toml(&bad),
            Err(ConfigError::Window(_))
        ));
    }

    #[test]
    fn rejects_misspelled_strategy_key() {
        let bad = PREDICTION.replace("start_up_candle_count", "start_up_candles");
        assert!(matches!(
            BacktestConfig::from_toml(&bad),
            Err(ConfigError::UnknownKey { ref key, .. }) if key == "start_up_candles"
        ));
    }

    #[test]
    fn rejects_key_of_another_kind() {
        let bad = PREDICTION.replace("\"prediction\"", "\"signal_column\"");
        assert!(matches!(
            BacktestConfig::from_toml(&bad),
            Err(ConfigError::UnknownKey { ref key, .. }) if key == "start_up_candle_count"
        ));
    }

    #[test]
    fn rejects_unknown_backtest_key() {
        let bad = PREDICTION.replace("starting_balance", "start_balance");
        assert!(matches!(
            BacktestConfig::from_toml(&bad),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_unknown_kind() {
        let bad = PREDICTION.replace("\"prediction\"", "\"martingale\"");
        assert!(matches!(
            BacktestConfig::from_toml(&bad),
            Err(ConfigError::Parse(_))
        ));
    }
}
