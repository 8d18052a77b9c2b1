//! Ledger — positions, running balance, and realized-outcome counters for one run.

use super::bar::Bar;
use super::position::{ExitReason, ExitRecord, Position};
use serde::{Deserialize, Serialize};

/// Last state transition recorded on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerAction {
    EnterLong,
    ExitTrade,
}

/// Mutable record of a single backtest run.
///
/// Only the engine mutates a ledger. Accounting identity, held after every
/// mutation: `balance + committed_stake() == starting_balance + realized_pnl()`.
#[derive(Debug, Clone)]
pub struct Ledger {
    starting_balance: f64,
    balance: f64,
    positions: Vec<Position>,
    last_action: Option<LedgerAction>,
    sl_hits: usize,
    tp_hits: usize,
    forced_exits: usize,
    total_trades: usize,
    wins: Vec<f64>,
    losses: Vec<f64>,
}

impl Ledger {
    pub fn new(starting_balance: f64) -> Self {
        Self {
            starting_balance,
            balance: starting_balance,
            positions: Vec::new(),
            last_action: None,
            sl_hits: 0,
            tp_hits: 0,
            forced_exits: 0,
            total_trades: 0,
            wins: Vec::new(),
            losses: Vec::new(),
        }
    }

    pub fn starting_balance(&self) -> f64 {
        self.starting_balance
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// All positions in entry order, open and closed.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn open_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter().filter(|p| !p.is_closed())
    }

    pub fn closed_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter().filter(|p| p.is_closed())
    }

    pub fn open_count(&self) -> usize {
        self.open_positions().count()
    }

    pub fn last_action(&self) -> Option<LedgerAction> {
        self.last_action
    }

    pub fn sl_hits(&self) -> usize {
        self.sl_hits
    }

    pub fn tp_hits(&self) -> usize {
        self.tp_hits
    }

    pub fn forced_exits(&self) -> usize {
        self.forced_exits
    }

    /// Number of accepted entries.
    pub fn total_trades(&self) -> usize {
        self.total_trades
    }

    /// Realized gains, one positive magnitude per winning close.
    pub fn wins(&self) -> &[f64] {
        &self.wins
    }

    /// Realized losses, one positive magnitude per losing close.
    pub fn losses(&self) -> &[f64] {
        &self.losses
    }

    /// Forced exits that settled exactly at the stake (no win or loss recorded).
    pub fn breakeven_exits(&self) -> usize {
        self.closed_positions()
            .filter_map(|p| p.exit())
            .filter(|e| e.reason.is_forced() && e.pnl == 0.0)
            .count()
    }

    /// Capital currently tied up in open positions.
    pub fn committed_stake(&self) -> f64 {
        self.open_positions().map(|p| p.stake).sum()
    }

    pub fn realized_pnl(&self) -> f64 {
        self.closed_positions()
            .filter_map(|p| p.exit())
            .map(|e| e.pnl)
            .sum()
    }

    pub fn can_afford(&self, stake: f64) -> bool {
        self.balance >= stake
    }

    /// Open a position at the bar's close if the balance covers the stake.
    ///
    /// Returns the index of the new position, or `None` when capital is
    /// insufficient.
    pub(crate) fn try_open(&mut self, bar_index: usize, bar: &Bar, stake: f64) -> Option<usize> {
        if !self.can_afford(stake) {
            return None;
        }
        let id = self.positions.len();
        self.positions
            .push(Position::open(id, bar_index, bar.timestamp, bar.close, stake));
        self.balance -= stake;
        self.total_trades += 1;
        self.last_action = Some(LedgerAction::EnterLong);
        Some(id)
    }

    /// Settle the position at `index` at `price`.
    ///
    /// Proceeds return to the balance, the outcome magnitude goes to wins or
    /// losses by sign, and the counter for `reason` is incremented. A
    /// position that is already closed is left untouched and `false` is
    /// returned.
    pub(crate) fn settle(
        &mut self,
        index: usize,
        bar_index: usize,
        bar: &Bar,
        price: f64,
        reason: ExitReason,
    ) -> bool {
        let Some(position) = self.positions.get_mut(index) else {
            return false;
        };
        if position.is_closed() {
            return false;
        }

        let proceeds = position.market_value(price);
        let pnl = proceeds - position.stake;
        position.close(ExitRecord {
            bar_index,
            timestamp: bar.timestamp,
            price,
            proceeds,
            pnl,
            reason,
        });

        if pnl > 0.0 {
            self.wins.push(pnl);
        } else if pnl < 0.0 {
            self.losses.push(-pnl);
        }

        match reason {
            ExitReason::StopLoss => self.sl_hits += 1,
            ExitReason::TakeProfit => self.tp_hits += 1,
            ExitReason::ExitSignal | ExitReason::EndOfData => self.forced_exits += 1,
        }

        self.balance += proceeds;
        self.last_action = Some(LedgerAction::ExitTrade);
        true
    }

    /// Indices of positions that are still open, in entry order.
    pub(crate) fn open_indices(&self) -> Vec<usize> {
        self.positions
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_closed())
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> Bar {
        let ts = NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Bar::new(ts, close, close, close, close, 1_000.0)
    }

    #[test]
    fn open_deducts_stake() {
        let mut ledger = Ledger::new(1_000.0);
        let idx = ledger.try_open(0, &bar(1, 10.0), 100.0);
        assert_eq!(idx, Some(0));
        assert_eq!(ledger.balance(), 900.0);
        assert_eq!(ledger.total_trades(), 1);
        assert_eq!(ledger.committed_stake(), 100.0);
        assert_eq!(ledger.last_action(), Some(LedgerAction::EnterLong));
    }

    #[test]
    fn open_rejected_without_capital() {
        let mut ledger = Ledger::new(150.0);
        assert!(ledger.try_open(0, &bar(1, 10.0), 100.0).is_some());
        assert!(ledger.try_open(1, &bar(2, 10.0), 100.0).is_none());
        assert_eq!(ledger.balance(), 50.0);
        assert_eq!(ledger.total_trades(), 1);
    }

    #[test]
    fn exact_balance_is_enough() {
        let mut ledger = Ledger::new(100.0);
        assert!(ledger.try_open(0, &bar(1, 10.0), 100.0).is_some());
        assert_eq!(ledger.balance(), 0.0);
    }

    #[test]
    fn settle_records_loss_and_counter() {
        let mut ledger = Ledger::new(1_000.0);
        ledger.try_open(0, &bar(1, 10.0), 100.0);
        assert!(ledger.settle(0, 1, &bar(2, 9.0), 9.0, ExitReason::StopLoss));

        assert_eq!(ledger.balance(), 990.0);
        assert_eq!(ledger.losses(), &[10.0]);
        assert!(ledger.wins().is_empty());
        assert_eq!(ledger.sl_hits(), 1);
        assert_eq!(ledger.last_action(), Some(LedgerAction::ExitTrade));
        assert_eq!(ledger.open_count(), 0);
    }

    #[test]
    fn settle_is_idempotent() {
        let mut ledger = Ledger::new(1_000.0);
        ledger.try_open(0, &bar(1, 10.0), 100.0);
        assert!(ledger.settle(0, 1, &bar(2, 12.0), 12.0, ExitReason::TakeProfit));
        assert!(!ledger.settle(0, 2, &bar(3, 5.0), 5.0, ExitReason::EndOfData));

        assert_eq!(ledger.balance(), 1_020.0);
        assert_eq!(ledger.tp_hits(), 1);
        assert_eq!(ledger.forced_exits(), 0);
        assert_eq!(ledger.wins(), &[20.0]);
        assert!(ledger.losses().is_empty());
    }

    #[test]
    fn breakeven_forced_exit_has_no_amount() {
        let mut ledger = Ledger::new(1_000.0);
        ledger.try_open(0, &bar(1, 10.0), 100.0);
        ledger.settle(0, 1, &bar(2, 10.0), 10.0, ExitReason::ExitSignal);

        assert_eq!(ledger.forced_exits(), 1);
        assert_eq!(ledger.breakeven_exits(), 1);
        assert!(ledger.wins().is_empty());
        assert!(ledger.losses().is_empty());
        assert_eq!(ledger.balance(), 1_000.0);
    }

    #[test]
    fn settle_at_entry_price_is_exact_breakeven() {
        let mut ledger = Ledger::new(1_000.0);
        ledger.try_open(0, &bar(1, 11.0), 100.0);
        ledger.settle(0, 1, &bar(2, 11.0), 11.0, ExitReason::EndOfData);

        assert_eq!(ledger.positions()[0].exit().unwrap().pnl, 0.0);
        assert_eq!(ledger.breakeven_exits(), 1);
        assert_eq!(ledger.balance(), 1_000.0);
    }

    #[test]
    fn accounting_identity_holds() {
        let mut ledger = Ledger::new(500.0);
        ledger.try_open(0, &bar(1, 10.0), 100.0);
        ledger.try_open(1, &bar(2, 20.0), 100.0);
        ledger.settle(0, 2, &bar(3, 11.0), 11.0, ExitReason::ExitSignal);

        let lhs = ledger.balance() + ledger.committed_stake();
        let rhs = ledger.starting_balance() + ledger.realized_pnl();
        assert!((lhs - rhs).abs() < 1e-9);
        assert_eq!(ledger.open_indices(), vec![1]);
    }
}
