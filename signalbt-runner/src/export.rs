//! Reporting and export — JSON, CSV, and the console results table.
//!
//! Persisted JSON carries a `schema_version` field. Newer versions are
//! rejected on load.

use std::path::Path;

use anyhow::{bail, Context, Result};
use signalbt_core::domain::Position;
use signalbt_core::metrics::Metrics;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::runner::{BacktestResult, SCHEMA_VERSION};

/// Timestamp format used in the trade CSV.
const DATE_FORMAT: &str = "%Y/%m/%d-%H:%M";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

pub fn save_json(result: &BacktestResult, path: &Path) -> Result<()> {
    let json = export_json(result)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

pub fn load_json(path: &Path) -> Result<BacktestResult> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export positions as CSV, one row per trade. Open positions have empty
/// exit columns.
///
/// Columns: id, entry_bar, entry_time, entry_price, quantity, stake,
/// exit_bar, exit_time, exit_price, proceeds, pnl, bars_held, reason
pub fn export_trades_csv(trades: &[Position]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "id",
        "entry_bar",
        "entry_time",
        "entry_price",
        "quantity",
        "stake",
        "exit_bar",
        "exit_time",
        "exit_price",
        "proceeds",
        "pnl",
        "bars_held",
        "reason",
    ])?;

    for t in trades {
        let exit = t.exit();
        wtr.write_record([
            t.id.to_string(),
            t.entry_bar.to_string(),
            t.entry_time.format(DATE_FORMAT).to_string(),
            format!("{:.6}", t.entry_price),
            format!("{:.6}", t.quantity),
            format!("{:.2}", t.stake),
            exit.map(|e| e.bar_index.to_string()).unwrap_or_default(),
            exit.map(|e| e.timestamp.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            exit.map(|e| format!("{:.6}", e.price)).unwrap_or_default(),
            exit.map(|e| format!("{:.2}", e.proceeds)).unwrap_or_default(),
            exit.map(|e| format!("{:.2}", e.pnl)).unwrap_or_default(),
            t.bars_held().map(|n| n.to_string()).unwrap_or_default(),
            exit.map(|e| e.reason.as_str().to_string()).unwrap_or_default(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Console table ──────────────────────────────────────────────────

#[derive(Tabled)]
struct MetricsRow {
    wins: usize,
    losses: usize,
    win_amount: String,
    loss_amount: String,
    sl_hits: usize,
    tp_hits: usize,
    force_exits: usize,
    #[tabled(rename = "win_%")]
    win_pct: String,
    #[tabled(rename = "loss_%")]
    loss_pct: String,
    #[tabled(rename = "w/l_ratio")]
    win_loss_ratio: String,
    total_trades: usize,
    final_balance: String,
}

impl From<&Metrics> for MetricsRow {
    fn from(m: &Metrics) -> Self {
        let opt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |x| format!("{x:.2}"));
        Self {
            wins: m.wins,
            losses: m.losses,
            win_amount: format!("{:.2}", m.win_amount),
            loss_amount: format!("{:.2}", m.loss_amount),
            sl_hits: m.sl_hits,
            tp_hits: m.tp_hits,
            force_exits: m.force_exits,
            win_pct: opt(m.win_pct),
            loss_pct: opt(m.loss_pct),
            win_loss_ratio: opt(m.win_loss_ratio),
            total_trades: m.total_trades,
            final_balance: format!("{:.2}", m.final_balance),
        }
    }
}

/// Render the metrics as a single-row boxed table under a
/// `BACKTEST RESULTS` title. Undefined ratios print as `n/a`.
pub fn render_table(metrics: &Metrics) -> String {
    let table = Table::new([MetricsRow::from(metrics)])
        .with(Style::modern())
        .to_string();
    format!("BACKTEST RESULTS\n{table}\n")
}
