//! Live price feed buffer.
//!
//! Holds the single up-to-date history for a price-only source. Readers take a
//! snapshot and evaluate it; nothing captures the buffer by reference.

use std::collections::VecDeque;

use crate::domain::bar::{Bar, EnrichedBar, PricePoint};
use crate::domain::enrichment::{EnrichmentConfig, enrich_with};
use crate::domain::error::SigtraderError;
use crate::domain::policy::ScoringPolicy;
use crate::domain::signal::{Signal, current_signal};

#[derive(Debug, Clone, PartialEq)]
pub struct LiveConfig {
    /// Bars handed to the scorer for the current signal.
    pub signal_window: usize,
    /// Oldest observations are dropped past this length.
    pub buffer_capacity: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        LiveConfig {
            signal_window: 50,
            buffer_capacity: 500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LiveFeed {
    bars: VecDeque<Bar>,
    capacity: usize,
    received: usize,
}

impl LiveFeed {
    pub fn new(capacity: usize) -> Self {
        LiveFeed {
            bars: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            received: 0,
        }
    }

    /// Seed from historical bars; only the newest `capacity` are kept.
    pub fn with_history(capacity: usize, history: &[Bar]) -> Self {
        let mut feed = LiveFeed::new(capacity);
        for bar in history {
            feed.push_bar(bar.clone());
        }
        feed
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.bars.back()
    }

    /// Append one observation. Must be strictly after the latest and positive.
    pub fn push(&mut self, point: PricePoint) -> Result<(), SigtraderError> {
        self.received += 1;
        let line = self.received;
        if !point.price.is_finite() || point.price <= 0.0 {
            return Err(SigtraderError::InvalidBar {
                line,
                reason: format!("price must be positive, got {}", point.price),
            });
        }
        if let Some(last) = self.bars.back() {
            if point.timestamp <= last.timestamp {
                return Err(SigtraderError::InvalidBar {
                    line,
                    reason: format!(
                        "timestamp {} is not after {}",
                        point.timestamp, last.timestamp
                    ),
                });
            }
        }
        self.push_bar(Bar::from_price(&point));
        Ok(())
    }

    fn push_bar(&mut self, bar: Bar) {
        if self.bars.len() == self.capacity {
            self.bars.pop_front();
        }
        self.bars.push_back(bar);
    }

    /// Owned copy of the current history.
    pub fn snapshot(&self) -> Vec<Bar> {
        self.bars.iter().cloned().collect()
    }

    /// Enrich a snapshot with the price-only volume model.
    pub fn enriched_snapshot(&self, enrichment: &EnrichmentConfig) -> Vec<EnrichedBar> {
        enrich_with(
            &self.snapshot(),
            enrichment.lookback,
            enrichment.live_model(),
        )
    }

    pub fn current_signal(
        &self,
        enrichment: &EnrichmentConfig,
        live: &LiveConfig,
        policy: &ScoringPolicy,
    ) -> Signal {
        let enriched = self.enriched_snapshot(enrichment);
        current_signal(&enriched, live.signal_window, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::HoldReason;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn ts(i: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::seconds(3 * i)
    }

    fn point(i: i64, price: f64) -> PricePoint {
        PricePoint {
            timestamp: ts(i),
            price,
        }
    }

    #[test]
    fn push_appends_in_order() {
        let mut feed = LiveFeed::new(10);
        feed.push(point(0, 100.0)).unwrap();
        feed.push(point(1, 101.0)).unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed.latest().map(|b| b.close), Some(101.0));
    }

    #[test]
    fn rejects_out_of_order() {
        let mut feed = LiveFeed::new(10);
        feed.push(point(5, 100.0)).unwrap();
        let err = feed.push(point(5, 101.0)).unwrap_err();
        assert!(matches!(err, SigtraderError::InvalidBar { line: 2, .. }));
        assert!(feed.push(point(4, 101.0)).is_err());
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn rejects_non_positive_price() {
        let mut feed = LiveFeed::new(10);
        assert!(feed.push(point(0, 0.0)).is_err());
        assert!(feed.push(point(1, -3.0)).is_err());
        assert!(feed.push(point(2, f64::NAN)).is_err());
        assert!(feed.is_empty());
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut feed = LiveFeed::new(3);
        for i in 0..5 {
            feed.push(point(i, 100.0 + i as f64)).unwrap();
        }
        let closes: Vec<f64> = feed.snapshot().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![102.0, 103.0, 104.0]);
    }

    #[test]
    fn snapshot_is_independent_of_later_pushes() {
        let mut feed = LiveFeed::new(10);
        feed.push(point(0, 100.0)).unwrap();
        let snap = feed.snapshot();
        feed.push(point(1, 200.0)).unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(feed.len(), 2);
    }

    #[test]
    fn holds_until_window_filled() {
        let mut feed = LiveFeed::new(100);
        for i in 0..10 {
            feed.push(point(i, 100.0)).unwrap();
        }
        let signal = feed.current_signal(
            &EnrichmentConfig::default(),
            &LiveConfig::default(),
            &ScoringPolicy::standard(),
        );
        assert_eq!(
            signal,
            Signal::Hold {
                reason: HoldReason::AwaitingData { have: 10, need: 50 }
            }
        );
    }

    #[test]
    fn choppy_rally_produces_buy() {
        // Alternating ±0.6 steps on a steady climb: large mean move (volatility
        // proxy above the strong cutoff), price up > 3% over the lookback, and
        // fast SMA above slow.
        let mut feed = LiveFeed::new(200);
        for i in 0..80 {
            let trend = 100.0 + i as f64 * 0.5;
            let wiggle = if i % 2 == 0 { 0.6 } else { -0.6 };
            feed.push(point(i, trend + wiggle)).unwrap();
        }
        let signal = feed.current_signal(
            &EnrichmentConfig::default(),
            &LiveConfig::default(),
            &ScoringPolicy::standard(),
        );
        match signal {
            Signal::Trade(current) => {
                assert_eq!(current.proposal.direction.to_string(), "BUY");
                assert!(current.volume_change > 50.0);
                assert_eq!(current.sentiment, 0.7);
            }
            other => panic!("expected trade, got {other:?}"),
        }
    }

    #[test]
    fn with_history_keeps_newest() {
        let history: Vec<Bar> = (0..5)
            .map(|i| Bar::from_price(&point(i, 10.0 + i as f64)))
            .collect();
        let feed = LiveFeed::with_history(2, &history);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed.latest().map(|b| b.close), Some(14.0));
    }
}
