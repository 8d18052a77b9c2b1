//! Performance metrics — pure functions over a finished ledger.
//!
//! Ratios that would divide by zero are `None` (serialized as `null`):
//! percentages when no trade was taken, the win/loss ratio when nothing lost.

use serde::{Deserialize, Serialize};

use crate::domain::Ledger;

/// Summary statistics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub wins: usize,
    pub losses: usize,
    pub win_amount: f64,
    pub loss_amount: f64,
    pub sl_hits: usize,
    pub tp_hits: usize,
    pub force_exits: usize,
    /// `wins / total_trades * 100`.
    pub win_pct: Option<f64>,
    /// `losses / total_trades * 100`.
    pub loss_pct: Option<f64>,
    /// `wins / losses` (counts, not amounts).
    pub win_loss_ratio: Option<f64>,
    pub total_trades: usize,
    pub starting_balance: f64,
    pub final_balance: f64,
    pub net_pnl: f64,
}

impl Metrics {
    /// Derive all metrics from the ledger's final state.
    pub fn summarize(ledger: &Ledger) -> Self {
        let wins = ledger.wins().len();
        let losses = ledger.losses().len();
        let total_trades = ledger.total_trades();

        Self {
            wins,
            losses,
            win_amount: ledger.wins().iter().sum(),
            loss_amount: ledger.losses().iter().sum(),
            sl_hits: ledger.sl_hits(),
            tp_hits: ledger.tp_hits(),
            force_exits: ledger.forced_exits(),
            win_pct: percentage(wins, total_trades),
            loss_pct: percentage(losses, total_trades),
            win_loss_ratio: ratio(wins, losses),
            total_trades,
            starting_balance: ledger.starting_balance(),
            final_balance: ledger.balance(),
            net_pnl: ledger.balance() - ledger.starting_balance(),
        }
    }
}

/// `part / whole * 100`, undefined when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        return None;
    }
    Some(part as f64 / whole as f64 * 100.0)
}

/// `numerator / denominator`, undefined when `denominator` is zero.
pub fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some(numerator as f64 / denominator as f64)
}
