//! Per-bar transition functions: `(Ledger, Bar, params) -> Ledger`.
//!
//! Order within a bar:
//! 1. Entry signal: open one position unless the last action was an entry
//! 2. Exit signal: force-close every open position at the close
//! 3. Threshold sweep: stop-loss / take-profit on whatever is still open
//!
//! Because step 2 closes everything, step 3 never sees a position on an
//! exit-signal bar, so no position is counted twice.

use crate::domain::{Bar, ExitReason, Ledger, LedgerAction, Position, Signal, StrategyParams};
use tracing::{debug, warn};

/// Apply one bar to the ledger.
pub fn step(ledger: &mut Ledger, bar: &Bar, bar_index: usize, params: &StrategyParams) {
    match bar.signal {
        Some(Signal::EnterLong) => enter_long(ledger, bar, bar_index, params),
        Some(Signal::ExitLong) => {
            exit_all(ledger, bar, bar_index, ExitReason::ExitSignal);
        }
        None => {}
    }
    sweep_thresholds(ledger, bar, bar_index, params);
}

/// Terminal liquidation: force-close everything at the final bar's close.
pub fn liquidate(ledger: &mut Ledger, last_bar: &Bar, last_index: usize) -> usize {
    exit_all(ledger, last_bar, last_index, ExitReason::EndOfData)
}

/// Which threshold, if any, the position crosses at `close`.
///
/// Both boundaries are inclusive. A position valued exactly at its stake
/// crosses neither; a NaN valuation crosses neither.
pub fn threshold_exit(position: &Position, close: f64, params: &StrategyParams) -> Option<ExitReason> {
    let stake = position.stake;
    let value = position.market_value(close);

    if value < stake {
        let loss_ratio = (stake - value) / stake;
        (loss_ratio >= params.stop_loss).then_some(ExitReason::StopLoss)
    } else if value > stake {
        let gain_ratio = (value - stake) / stake;
        (gain_ratio >= params.take_profit).then_some(ExitReason::TakeProfit)
    } else {
        None
    }
}

fn enter_long(ledger: &mut Ledger, bar: &Bar, bar_index: usize, params: &StrategyParams) {
    if ledger.last_action() == Some(LedgerAction::EnterLong) {
        return;
    }
    if !(bar.close.is_finite() && bar.close > 0.0) {
        debug!(bar_index, close = bar.close, "entry skipped: close is not a positive price");
        return;
    }

    match ledger.try_open(bar_index, bar, params.stake_amount) {
        Some(id) => debug!(
            bar_index,
            position = id,
            price = bar.close,
            balance = ledger.balance(),
            "opened long"
        ),
        None => debug!(
            bar_index,
            balance = ledger.balance(),
            stake = params.stake_amount,
            "entry skipped: insufficient balance"
        ),
    }
}

fn exit_all(ledger: &mut Ledger, bar: &Bar, bar_index: usize, reason: ExitReason) -> usize {
    let mut closed = 0;
    for idx in ledger.open_indices() {
        let price = if bar.close.is_finite() {
            bar.close
        } else {
            // Settle at cost when the close is unusable.
            let entry_price = ledger.positions()[idx].entry_price;
            warn!(
                bar_index,
                position = idx,
                "non-finite close on forced exit, settling at entry price"
            );
            entry_price
        };
        if ledger.settle(idx, bar_index, bar, price, reason) {
            debug!(bar_index, position = idx, price, reason = reason.as_str(), "closed long");
            closed += 1;
        }
    }
    closed
}

fn sweep_thresholds(ledger: &mut Ledger, bar: &Bar, bar_index: usize, params: &StrategyParams) {
    for idx in ledger.open_indices() {
        let Some(reason) = threshold_exit(&ledger.positions()[idx], bar.close, params) else {
            continue;
        };
        if ledger.settle(idx, bar_index, bar, bar.close, reason) {
            debug!(
                bar_index,
                position = idx,
                price = bar.close,
                reason = reason.as_str(),
                "closed long"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn ts(i: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::minutes(3 * i)
    }

    fn bar(i: i64, close: f64, signal: Option<Signal>) -> Bar {
        let mut bar = Bar::new(ts(i), close, close, close, close, 10.0);
        bar.signal = signal;
        bar
    }

    fn params() -> StrategyParams {
        StrategyParams::new(100.0, 0.10, 0.20)
    }

    #[test]
    fn threshold_boundaries_are_inclusive() {
        let pos = Position::open(0, 0, ts(0), 10.0, 100.0);
        let p = params();
        assert_eq!(threshold_exit(&pos, 9.0, &p), Some(ExitReason::StopLoss));
        assert_eq!(threshold_exit(&pos, 12.0, &p), Some(ExitReason::TakeProfit));
        assert_eq!(threshold_exit(&pos, 9.5, &p), None);
        assert_eq!(threshold_exit(&pos, 11.0, &p), None);
        assert_eq!(threshold_exit(&pos, 10.0, &p), None);
        assert_eq!(threshold_exit(&pos, f64::NAN, &p), None);
    }

    #[test]
    fn consecutive_entries_do_not_stack() {
        let mut ledger = Ledger::new(1_000.0);
        let p = params();
        step(&mut ledger, &bar(0, 10.0, Some(Signal::EnterLong)), 0, &p);
        step(&mut ledger, &bar(1, 10.0, Some(Signal::EnterLong)), 1, &p);
        assert_eq!(ledger.total_trades(), 1);
        assert_eq!(ledger.balance(), 900.0);
    }

    #[test]
    fn reentry_allowed_after_exit() {
        let mut ledger = Ledger::new(1_000.0);
        let p = params();
        step(&mut ledger, &bar(0, 10.0, Some(Signal::EnterLong)), 0, &p);
        step(&mut ledger, &bar(1, 11.0, None), 1, &p);
        assert_eq!(ledger.open_count(), 1);
        step(&mut ledger, &bar(2, 12.0, None), 2, &p);
        assert_eq!(ledger.last_action(), Some(LedgerAction::ExitTrade));
        step(&mut ledger, &bar(3, 12.0, Some(Signal::EnterLong)), 3, &p);
        step(&mut ledger, &bar(4, 12.0, Some(Signal::EnterLong)), 4, &p);
        assert_eq!(ledger.total_trades(), 2);
    }

    #[test]
    fn exit_signal_closes_everything_before_sweep() {
        let mut ledger = Ledger::new(1_000.0);
        let p = params();
        step(&mut ledger, &bar(0, 10.0, Some(Signal::EnterLong)), 0, &p);
        // Loss of 20% would also trip the stop, but the exit signal wins.
        step(&mut ledger, &bar(1, 8.0, Some(Signal::ExitLong)), 1, &p);

        assert_eq!(ledger.forced_exits(), 1);
        assert_eq!(ledger.sl_hits(), 0);
        assert_eq!(ledger.losses(), &[20.0]);
        assert_eq!(ledger.open_count(), 0);
    }

    #[test]
    fn forced_exit_at_nan_close_settles_at_cost() {
        let mut ledger = Ledger::new(1_000.0);
        let p = params();
        step(&mut ledger, &bar(0, 10.0, Some(Signal::EnterLong)), 0, &p);
        let closed = liquidate(&mut ledger, &bar(1, f64::NAN, None), 1);

        assert_eq!(closed, 1);
        assert_eq!(ledger.forced_exits(), 1);
        assert_eq!(ledger.balance(), 1_000.0);
        assert_eq!(ledger.breakeven_exits(), 1);
    }

    #[test]
    fn entry_skipped_on_zero_price() {
        let mut ledger = Ledger::new(1_000.0);
        step(&mut ledger, &bar(0, 0.0, Some(Signal::EnterLong)), 0, &params());
        assert_eq!(ledger.total_trades(), 0);
        assert_eq!(ledger.last_action(), None);
    }
}
