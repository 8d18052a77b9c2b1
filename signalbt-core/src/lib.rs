//! SignalBT Core — bars, trade ledger, backtest engine, metrics, strategy pipeline.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars with signals, positions, the ledger, strategy params)
//! - Bar-by-bar fold with entry, forced-exit, and stop-loss/take-profit rules
//! - Terminal liquidation after the last bar
//! - Metrics aggregation over the finished ledger
//! - Strategy trait with an optional feature/prediction capability

pub mod domain;
pub mod engine;
pub mod metrics;
pub mod strategy;

pub use domain::{Bar, Ledger, Signal, StrategyParams};
pub use engine::{run_backtest, EngineConfig, EngineError};
pub use metrics::Metrics;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: core types are Send + Sync, so independent runs
    /// can be moved onto worker threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Ledger>();
        require_sync::<domain::Ledger>();
        require_send::<domain::StrategyParams>();
        require_sync::<domain::StrategyParams>();

        require_send::<engine::EngineConfig>();
        require_sync::<engine::EngineConfig>();
        require_send::<metrics::Metrics>();
        require_sync::<metrics::Metrics>();

        require_send::<strategy::SignalFrame>();
        require_sync::<strategy::SignalFrame>();
        require_send::<strategy::PredictionStrategy>();
        require_sync::<strategy::PredictionStrategy>();
    }

    /// Architecture contract: strategies label bars but never see the ledger.
    ///
    /// Every pipeline method takes only `&mut SignalFrame`. If a ledger
    /// parameter is ever added, this stops compiling.
    #[test]
    fn strategy_trait_has_no_ledger_parameter() {
        fn _check_trait_object_builds(
            strat: &dyn strategy::Strategy,
            frame: &mut strategy::SignalFrame,
        ) -> Result<(), strategy::StrategyError> {
            strat.populate_entry_signal(frame)
        }
    }
}
