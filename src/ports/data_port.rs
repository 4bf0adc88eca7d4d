//! Bar source port trait.

use crate::domain::bar::Bar;
use crate::domain::error::SigtraderError;
use chrono::NaiveDateTime;

/// A row the loader skipped, with its 1-based line number.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub line: usize,
    pub reason: String,
}

/// Accepted bars in chronological order plus the rows that were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedBars {
    pub bars: Vec<Bar>,
    pub rejected: Vec<RejectedRow>,
}

impl LoadedBars {
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match (self.bars.first(), self.bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }
}

pub trait DataPort {
    fn load_bars(&self) -> Result<LoadedBars, SigtraderError>;
}
