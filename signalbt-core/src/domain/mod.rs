//! Domain types for SignalBT

pub mod bar;
pub mod ledger;
pub mod params;
pub mod position;

pub use bar::{Bar, Signal, SignalParseError};
pub use ledger::{Ledger, LedgerAction};
pub use params::{ParamsError, StrategyParams};
pub use position::{ExitReason, ExitRecord, Position};
