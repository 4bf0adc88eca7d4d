#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
pub use sigtrader::domain::bar::{Bar, EnrichedBar, PricePoint};
use sigtrader::domain::error::SigtraderError;
use sigtrader::ports::data_port::{DataPort, LoadedBars, RejectedRow};

pub struct MockDataPort {
    pub loaded: LoadedBars,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self {
            loaded: LoadedBars {
                bars,
                rejected: Vec::new(),
            },
            error: None,
        }
    }

    pub fn with_rejected(mut self, line: usize, reason: &str) -> Self {
        self.loaded.rejected.push(RejectedRow {
            line,
            reason: reason.to_string(),
        });
        self
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            loaded: LoadedBars::default(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn load_bars(&self) -> Result<LoadedBars, SigtraderError> {
        match &self.error {
            Some(reason) => Err(SigtraderError::DataLoad {
                reason: reason.clone(),
            }),
            None => Ok(self.loaded.clone()),
        }
    }
}

/// 15-minute bar timestamps from 2024-01-01 00:00.
pub fn ts(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::minutes(15 * i as i64)
}

pub fn make_bar(i: usize, close: f64, volume: f64) -> Bar {
    Bar {
        timestamp: ts(i),
        open: close,
        high: close,
        low: close,
        close,
        volume,
    }
}

pub fn flat_bars(n: usize, close: f64, volume: f64) -> Vec<Bar> {
    (0..n).map(|i| make_bar(i, close, volume)).collect()
}

/// 150 flat bars with a volume spike at 60 and a close of 113 at 65.
pub fn spike_then_rally() -> Vec<Bar> {
    let mut bars = flat_bars(150, 100.0, 1000.0);
    bars[60].volume = 2000.0;
    bars[65] = make_bar(65, 113.0, 1000.0);
    bars
}

/// Enriched bars with the features set directly.
pub fn make_enriched(i: usize, close: f64, volume_change: f64, sentiment: f64) -> EnrichedBar {
    EnrichedBar {
        bar: make_bar(i, close, 1000.0),
        volume_change,
        sentiment,
    }
}

pub fn bars_to_csv(bars: &[Bar]) -> String {
    let mut out = String::from("time,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}
