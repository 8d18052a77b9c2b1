//! CSV data loading — decorated bars into a `SignalFrame`.
//!
//! Required columns: `timestamp, open, high, low, close, volume`. An optional
//! `signal` column carries pre-computed labels (`enter_long` / `exit_long` /
//! empty). Every other column is parsed as a numeric decoration column; empty
//! cells become NaN.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use signalbt_core::domain::{Bar, Signal, SignalParseError};
use signalbt_core::strategy::{SignalFrame, StrategyError};
use thiserror::Error;
use tracing::{debug, info};

const REQUIRED: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];
const SIGNAL_COLUMN: &str = "signal";

/// Window bound format, e.g. `2024/01/01-00:00`.
pub const WINDOW_FORMAT: &str = "%Y/%m/%d-%H:%M";

/// Errors from data loading. Row numbers are 1-based data rows (header excluded).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: missing value for '{column}'")]
    MissingField { row: usize, column: String },

    #[error("row {row}: cannot parse '{value}' in column '{column}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: unrecognized timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },

    #[error("row {row}: {source}")]
    InvalidSignal {
        row: usize,
        #[source]
        source: SignalParseError,
    },

    #[error("row {row}: timestamp {timestamp} does not follow {previous}")]
    NonMonotonic {
        row: usize,
        timestamp: NaiveDateTime,
        previous: NaiveDateTime,
    },

    #[error("frame error: {0}")]
    Frame(#[from] StrategyError),
}

/// Inclusive `[start, end]` slice of the input. Open on either side when `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl TimeWindow {
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }
}

/// Result of loading a data file.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub frame: SignalFrame,
    /// blake3 over the windowed bars and decoration columns.
    pub dataset_hash: String,
    /// Rows in the file before windowing.
    pub rows_read: usize,
}

/// Parse a window bound. Accepts the window format plus anything
/// [`parse_timestamp`] understands.
pub fn parse_window_bound(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), WINDOW_FORMAT)
        .ok()
        .or_else(|| parse_timestamp(s))
}

/// Parse a bar timestamp.
///
/// Accepted: RFC 3339, `%Y-%m-%d %H:%M:%S`, `%Y-%m-%dT%H:%M:%S`,
/// `%Y/%m/%d-%H:%M`, `%Y-%m-%d`, and integer epochs (seconds, or
/// milliseconds above 10^11).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", WINDOW_FORMAT] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(epoch) = s.parse::<i64>() {
        let dt = if epoch.abs() > 100_000_000_000 {
            DateTime::from_timestamp_millis(epoch)
        } else {
            DateTime::from_timestamp(epoch, 0)
        };
        return dt.map(|d| d.naive_utc());
    }
    None
}

/// Load a CSV file.
pub fn load_frame(path: &Path, window: &TimeWindow) -> Result<LoadedData, LoadError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    let loaded = load_frame_from_reader(file, window)?;
    info!(
        path = %path.display(),
        rows = loaded.rows_read,
        bars = loaded.frame.len(),
        hash = %loaded.dataset_hash,
        "loaded data"
    );
    Ok(loaded)
}

/// Load CSV from any reader. Timestamps must strictly increase across the
/// whole file; the window is applied afterwards.
pub fn load_frame_from_reader<R: Read>(
    reader: R,
    window: &TimeWindow,
) -> Result<LoadedData, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let index_of = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let mut required = [0usize; 6];
    for (slot, name) in required.iter_mut().zip(REQUIRED) {
        *slot = index_of(name).ok_or_else(|| LoadError::MissingColumn(name.to_string()))?;
    }
    let signal_idx = index_of(SIGNAL_COLUMN);
    let extra: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| !required.contains(&i) && Some(i) != signal_idx)
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut bars = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); extra.len()];
    let mut previous: Option<NaiveDateTime> = None;
    let mut rows_read = 0;

    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        rows_read += 1;

        let field = |idx: usize, column: &str| {
            record
                .get(idx)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| LoadError::MissingField {
                    row,
                    column: column.to_string(),
                })
        };

        let raw_ts = field(required[0], REQUIRED[0])?;
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| LoadError::InvalidTimestamp {
            row,
            value: raw_ts.to_string(),
        })?;
        if let Some(prev) = previous {
            if timestamp <= prev {
                return Err(LoadError::NonMonotonic {
                    row,
                    timestamp,
                    previous: prev,
                });
            }
        }
        previous = Some(timestamp);

        let mut ohlcv = [0.0; 5];
        for (k, value) in ohlcv.iter_mut().enumerate() {
            let column = REQUIRED[k + 1];
            *value = parse_number(field(required[k + 1], column)?, row, column)?;
        }

        if !window.contains(timestamp) {
            continue;
        }

        let mut bar = Bar::new(timestamp, ohlcv[0], ohlcv[1], ohlcv[2], ohlcv[3], ohlcv[4]);
        if let Some(raw) = signal_idx.and_then(|idx| record.get(idx)) {
            if !raw.is_empty() {
                let signal: Signal = raw
                    .parse()
                    .map_err(|source| LoadError::InvalidSignal { row, source })?;
                bar.signal = Some(signal);
            }
        }
        bars.push(bar);

        for ((idx, name), values) in extra.iter().zip(columns.iter_mut()) {
            let value = match record.get(*idx) {
                Some(raw) if !raw.is_empty() => parse_number(raw, row, name)?,
                _ => f64::NAN,
            };
            values.push(value);
        }
    }

    let decorations: HashMap<String, Vec<f64>> = extra
        .into_iter()
        .map(|(_, name)| name)
        .zip(columns)
        .collect();
    let dataset_hash = compute_dataset_hash(&bars, &decorations);

    let mut frame = SignalFrame::new(bars);
    for (name, values) in decorations {
        frame.insert_column(name, values)?;
    }
    debug!(columns = ?frame.column_names(), "decoration columns");

    Ok(LoadedData {
        frame,
        dataset_hash,
        rows_read,
    })
}

fn parse_number(raw: &str, row: usize, column: &str) -> Result<f64, LoadError> {
    raw.parse::<f64>().map_err(|_| LoadError::InvalidNumber {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

/// Deterministic hash of the bars and decoration columns.
fn compute_dataset_hash(bars: &[Bar], decorations: &HashMap<String, Vec<f64>>) -> String {
    let mut hasher = blake3::Hasher::new();

    for bar in bars {
        hasher.update(bar.timestamp.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
        hasher.update(bar.signal.map_or("", |s| s.as_str()).as_bytes());
    }

    // Sorted for deterministic ordering
    let mut names: Vec<&String> = decorations.keys().collect();
    names.sort();
    for name in names {
        hasher.update(name.as_bytes());
        for v in &decorations[name] {
            hasher.update(&v.to_le_bytes());
        }
    }

    hasher.finalize().to_hex().to_string()
}
