//! Per-bar feature enrichment.
//!
//! volume_change[i] = (V[i] - avg(V[i-L..i])) / avg * 100, 0 if avg == 0
//! sentiment[i]     = piecewise(ROC(C[i-L], C[i])), clamped to [-1, 1]
//! Warmup: both are 0 for the first L bars.
//!
//! Price-only feeds have no volume; they substitute a volatility proxy,
//! mean |ΔC| over the window divided by the window's mean close, scaled.

use crate::domain::bar::{Bar, EnrichedBar};
use crate::domain::indicator::{mean, mean_abs_change, rate_of_change};

pub const DEFAULT_LOOKBACK: usize = 28;
pub const DEFAULT_VOLATILITY_SCALE: f64 = 10_000.0;

/// Where the volume-change feature comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumeModel {
    /// True traded volume from an OHLCV source.
    Reported,
    /// Price-only source: scaled mean absolute move relative to mean price.
    VolatilityProxy { scale: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentConfig {
    pub lookback: usize,
    pub live_volatility_scale: f64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        EnrichmentConfig {
            lookback: DEFAULT_LOOKBACK,
            live_volatility_scale: DEFAULT_VOLATILITY_SCALE,
        }
    }
}

impl EnrichmentConfig {
    pub fn live_model(&self) -> VolumeModel {
        VolumeModel::VolatilityProxy {
            scale: self.live_volatility_scale,
        }
    }
}

/// Enrich an OHLCV sequence. Output has the same length and order.
pub fn enrich(bars: &[Bar], lookback: usize) -> Vec<EnrichedBar> {
    enrich_with(bars, lookback, VolumeModel::Reported)
}

pub fn enrich_with(bars: &[Bar], lookback: usize, model: VolumeModel) -> Vec<EnrichedBar> {
    (0..bars.len())
        .map(|i| {
            let volume_change = match model {
                VolumeModel::Reported => volume_change_at(bars, i, lookback),
                VolumeModel::VolatilityProxy { scale } => {
                    volatility_proxy_at(bars, i, lookback, scale)
                }
            };
            EnrichedBar {
                bar: bars[i].clone(),
                volume_change,
                sentiment: sentiment_at(bars, i, lookback),
            }
        })
        .collect()
}

pub fn volume_change_at(bars: &[Bar], index: usize, lookback: usize) -> f64 {
    if lookback == 0 || index < lookback || index >= bars.len() {
        return 0.0;
    }
    let volumes: Vec<f64> = bars[index - lookback..index]
        .iter()
        .map(|b| b.volume)
        .collect();
    match mean(&volumes) {
        Some(avg) if avg > 0.0 => (bars[index].volume - avg) / avg * 100.0,
        _ => 0.0,
    }
}

pub fn volatility_proxy_at(bars: &[Bar], index: usize, lookback: usize, scale: f64) -> f64 {
    if lookback == 0 || index < lookback || index >= bars.len() {
        return 0.0;
    }
    let closes: Vec<f64> = bars[index - lookback..=index]
        .iter()
        .map(|b| b.close)
        .collect();
    let avg_move = mean_abs_change(&closes).unwrap_or(0.0);
    match mean(&closes[..lookback]) {
        Some(avg_price) if avg_price > 0.0 => avg_move / avg_price * scale,
        _ => 0.0,
    }
}

pub fn sentiment_at(bars: &[Bar], index: usize, lookback: usize) -> f64 {
    if lookback == 0 || index < lookback || index >= bars.len() {
        return 0.0;
    }
    let change = rate_of_change(bars[index - lookback].close, bars[index].close);
    sentiment_from_change(change)
}

/// Map a percent price change onto the sentiment scale.
pub fn sentiment_from_change(price_change: f64) -> f64 {
    let raw = if price_change > 3.0 {
        0.7
    } else if price_change > 1.0 {
        0.4
    } else if price_change < -3.0 {
        -0.7
    } else if price_change < -1.0 {
        -0.4
    } else {
        price_change * 0.1
    };
    raw.clamp(-1.0, 1.0)
}
