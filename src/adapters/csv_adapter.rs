//! Delimited-text bar loader.
//!
//! Header row, then time, open, high, low, close, volume. Tab-separated when
//! the header contains a tab, comma-separated otherwise. Malformed rows are
//! skipped and reported, never patched with defaults.

use crate::domain::bar::Bar;
use crate::domain::error::SigtraderError;
use crate::ports::data_port::{DataPort, LoadedBars, RejectedRow};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%d/%m/%Y %H:%M",
];

/// Epoch values above this are taken as milliseconds.
const EPOCH_MILLIS_CUTOFF: i64 = 100_000_000_000;

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl DataPort for CsvAdapter {
    fn load_bars(&self) -> Result<LoadedBars, SigtraderError> {
        let content = fs::read_to_string(&self.path).map_err(|e| SigtraderError::DataLoad {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        let loaded = parse_bars(&content)?;
        info!(
            path = %self.path.display(),
            accepted = loaded.bars.len(),
            rejected = loaded.rejected.len(),
            "loaded bars"
        );
        Ok(loaded)
    }
}

/// Parse delimited text into chronologically ordered bars.
pub fn parse_bars(content: &str) -> Result<LoadedBars, SigtraderError> {
    let header = content.lines().next().unwrap_or_default();
    if header.trim().is_empty() {
        return Err(SigtraderError::DataLoad {
            reason: "input is empty".into(),
        });
    }
    let delimiter = if header.contains('\t') { b'\t' } else { b',' };

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut loaded = LoadedBars::default();

    for (i, result) in rdr.records().enumerate() {
        // Line 1 is the header.
        let fallback_line = i + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                reject(&mut loaded, fallback_line, format!("unreadable row: {e}"));
                continue;
            }
        };
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);

        if record.iter().all(str::is_empty) {
            continue;
        }

        let bar = match parse_record(&record) {
            Ok(bar) => bar,
            Err(reason) => {
                reject(&mut loaded, line, reason);
                continue;
            }
        };

        if let Some(reason) = bar.defect() {
            reject(&mut loaded, line, reason);
            continue;
        }

        if let Some(prev) = loaded.bars.last() {
            if bar.timestamp <= prev.timestamp {
                let reason = format!(
                    "timestamp {} is not after previous {}",
                    bar.timestamp, prev.timestamp
                );
                reject(&mut loaded, line, reason);
                continue;
            }
        }

        loaded.bars.push(bar);
    }

    Ok(loaded)
}

fn reject(loaded: &mut LoadedBars, line: usize, reason: String) {
    warn!(line, %reason, "skipping row");
    loaded.rejected.push(RejectedRow { line, reason });
}

fn parse_record(record: &csv::StringRecord) -> Result<Bar, String> {
    if record.len() < 6 {
        return Err(format!("expected 6 columns, found {}", record.len()));
    }
    let field = |idx: usize| clean(record.get(idx).unwrap_or_default());

    let timestamp = parse_timestamp(&field(0))?;
    Ok(Bar {
        timestamp,
        open: parse_number(&field(1), "open")?,
        high: parse_number(&field(2), "high")?,
        low: parse_number(&field(3), "low")?,
        close: parse_number(&field(4), "close")?,
        volume: parse_number(&field(5), "volume")?,
    })
}

fn clean(value: &str) -> String {
    value.trim().replace(['"', '\''], "")
}

fn parse_number(value: &str, column: &str) -> Result<f64, String> {
    if value.is_empty() {
        return Err(format!("missing {column} value"));
    }
    let n: f64 = value
        .parse()
        .map_err(|e| format!("invalid {column} value '{value}': {e}"))?;
    if n.is_finite() {
        Ok(n)
    } else {
        Err(format!("invalid {column} value '{value}'"))
    }
}

/// Accepts the common date-time layouts, bare dates, and unix epoch seconds or milliseconds.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    if value.is_empty() {
        return Err("missing time value".into());
    }

    if let Ok(epoch) = value.parse::<i64>() {
        let dt = if epoch.abs() > EPOCH_MILLIS_CUTOFF {
            DateTime::from_timestamp_millis(epoch)
        } else {
            DateTime::from_timestamp(epoch, 0)
        };
        return dt
            .map(|d| d.naive_utc())
            .ok_or_else(|| format!("epoch value out of range: {value}"));
    }

    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(ts);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(ts) = date.and_hms_opt(0, 0, 0) {
            return Ok(ts);
        }
    }

    Err(format!("unrecognised time value '{value}'"))
}
