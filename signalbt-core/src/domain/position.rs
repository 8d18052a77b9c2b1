//! Position — one long trade, open or closed.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    /// Closed by an `exit_long` signal.
    ExitSignal,
    /// Closed by terminal liquidation after the last bar.
    EndOfData,
}

impl ExitReason {
    /// Forced exits close unconditionally, regardless of profit or loss.
    pub fn is_forced(&self) -> bool {
        matches!(self, Self::ExitSignal | Self::EndOfData)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StopLoss => "stop_loss",
            Self::TakeProfit => "take_profit",
            Self::ExitSignal => "exit_signal",
            Self::EndOfData => "end_of_data",
        }
    }
}

/// Settlement details recorded when a position closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitRecord {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub price: f64,
    /// Cash returned to the ledger: `quantity * price`.
    pub proceeds: f64,
    /// `proceeds - stake`.
    pub pnl: f64,
    pub reason: ExitReason,
}

/// A long position sized by a fixed stake.
///
/// The exit record is written exactly once; a closed position is never
/// reopened or mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: usize,
    pub entry_bar: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub quantity: f64,
    pub stake: f64,
    exit: Option<ExitRecord>,
}

impl Position {
    pub fn open(
        id: usize,
        entry_bar: usize,
        entry_time: NaiveDateTime,
        entry_price: f64,
        stake: f64,
    ) -> Self {
        Self {
            id,
            entry_bar,
            entry_time,
            entry_price,
            quantity: stake / entry_price,
            stake,
            exit: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.exit.is_some()
    }

    pub fn exit(&self) -> Option<&ExitRecord> {
        self.exit.as_ref()
    }

    /// Value at `price`. At the entry price this is exactly the stake.
    pub fn market_value(&self, price: f64) -> f64 {
        if price == self.entry_price {
            self.stake
        } else {
            self.quantity * price
        }
    }

    /// Number of bars between entry and exit, if closed.
    pub fn bars_held(&self) -> Option<usize> {
        self.exit
            .as_ref()
            .map(|e| e.bar_index.saturating_sub(self.entry_bar))
    }

    /// Record the exit. Returns false (and changes nothing) if already closed.
    pub(crate) fn close(&mut self, record: ExitRecord) -> bool {
        if self.exit.is_some() {
            return false;
        }
        self.exit = Some(record);
        true
    }
}
