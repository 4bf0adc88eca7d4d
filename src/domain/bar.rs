//! Price bar representations.

use chrono::NaiveDateTime;

/// One OHLCV observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Build a bar from a single price observation (no range, no volume).
    pub fn from_price(point: &PricePoint) -> Self {
        Bar {
            timestamp: point.timestamp,
            open: point.price,
            high: point.price,
            low: point.price,
            close: point.price,
            volume: 0.0,
        }
    }

    /// Reason the bar is unusable, if any.
    pub fn defect(&self) -> Option<String> {
        if !self.close.is_finite() || self.close <= 0.0 {
            return Some(format!("close must be positive, got {}", self.close));
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Some(format!("volume must be non-negative, got {}", self.volume));
        }
        None
    }
}

/// A single price from a live feed that carries no volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

/// A bar plus features derived from the bars before it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedBar {
    pub bar: Bar,
    /// Percent deviation of volume from the trailing average.
    pub volume_change: f64,
    /// Trailing price momentum mapped into [-1, 1].
    pub sentiment: f64,
}

impl EnrichedBar {
    pub fn timestamp(&self) -> NaiveDateTime {
        self.bar.timestamp
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn sample_bar() -> Bar {
        Bar {
            timestamp: ts(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn valid_bar_has_no_defect() {
        assert_eq!(sample_bar().defect(), None);
    }

    #[test]
    fn zero_close_is_defect() {
        let bar = Bar {
            close: 0.0,
            ..sample_bar()
        };
        assert!(bar.defect().unwrap().contains("close"));
    }

    #[test]
    fn negative_volume_is_defect() {
        let bar = Bar {
            volume: -1.0,
            ..sample_bar()
        };
        assert!(bar.defect().unwrap().contains("volume"));
    }

    #[test]
    fn nan_close_is_defect() {
        let bar = Bar {
            close: f64::NAN,
            ..sample_bar()
        };
        assert!(bar.defect().is_some());
    }

    #[test]
    fn from_price_flattens_range() {
        let bar = Bar::from_price(&PricePoint {
            timestamp: ts(),
            price: 87_687.0,
        });
        assert_eq!(bar.open, 87_687.0);
        assert_eq!(bar.high, 87_687.0);
        assert_eq!(bar.low, 87_687.0);
        assert_eq!(bar.close, 87_687.0);
        assert_eq!(bar.volume, 0.0);
    }
}
