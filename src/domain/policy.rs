//! Scoring policy: feature cutoffs, weights, decision threshold, and risk levels.
//!
//! Two named presets exist. `Standard` is the default; `Strict` raises every
//! cutoff. Any individual value can be overridden from configuration.

use std::fmt;
use std::str::FromStr;

/// Categorical cutoffs for the volume term (percent volume change).
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeCutoffs {
    pub strong_up: f64,
    pub up: f64,
    pub strong_down: f64,
    pub down: f64,
    pub strong_weight: f64,
    pub weak_weight: f64,
}

impl VolumeCutoffs {
    pub fn contribution(&self, volume_change: f64) -> f64 {
        if volume_change > self.strong_up {
            self.strong_weight
        } else if volume_change > self.up {
            self.weak_weight
        } else if volume_change < self.strong_down {
            -self.strong_weight
        } else if volume_change < self.down {
            -self.weak_weight
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentRule {
    pub weight: f64,
    /// |sentiment| must exceed this for the term to count. 0 disables the tier.
    pub min_magnitude: f64,
}

impl SentimentRule {
    pub fn contribution(&self, sentiment: f64) -> f64 {
        if self.min_magnitude > 0.0 && sentiment.abs() <= self.min_magnitude {
            return 0.0;
        }
        sentiment * self.weight
    }
}

/// SMA spread rule over the window's closes.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentumRule {
    pub fast: usize,
    /// Optional middle average; when set, a full contribution needs
    /// fast > mid > slow and a fast/slow-only spread earns `partial_weight`.
    pub mid: Option<usize>,
    pub slow: usize,
    /// Fractional spread required, e.g. 0.005 = 0.5%.
    pub band: f64,
    pub weight: f64,
    pub partial_weight: f64,
    /// Closes taken from the tail of the window; fewer available means no term.
    pub min_prices: usize,
}

/// Trade levels relative to entry, in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskParams {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl Default for RiskParams {
    fn default() -> Self {
        RiskParams {
            stop_loss_pct: 4.0,
            take_profit_pct: 12.0,
        }
    }
}

impl RiskParams {
    pub fn risk_reward(&self) -> f64 {
        if self.stop_loss_pct > 0.0 {
            self.take_profit_pct / self.stop_loss_pct
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyPreset {
    Standard,
    Strict,
}

impl fmt::Display for PolicyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyPreset::Standard => write!(f, "standard"),
            PolicyPreset::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for PolicyPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(PolicyPreset::Standard),
            "strict" => Ok(PolicyPreset::Strict),
            other => Err(format!("unknown policy '{other}', expected standard or strict")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPolicy {
    pub preset: PolicyPreset,
    pub threshold: f64,
    /// Minimum trailing window length; shorter windows never signal.
    pub min_window: usize,
    pub volume: VolumeCutoffs,
    pub sentiment: SentimentRule,
    pub momentum: MomentumRule,
    pub risk: RiskParams,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        ScoringPolicy::standard()
    }
}

impl ScoringPolicy {
    pub fn from_preset(preset: PolicyPreset) -> Self {
        match preset {
            PolicyPreset::Standard => ScoringPolicy::standard(),
            PolicyPreset::Strict => ScoringPolicy::strict(),
        }
    }

    pub fn standard() -> Self {
        ScoringPolicy {
            preset: PolicyPreset::Standard,
            threshold: 0.35,
            min_window: 20,
            volume: VolumeCutoffs {
                strong_up: 50.0,
                up: 25.0,
                strong_down: -30.0,
                down: -15.0,
                strong_weight: 0.4,
                weak_weight: 0.2,
            },
            sentiment: SentimentRule {
                weight: 0.35,
                min_magnitude: 0.0,
            },
            momentum: MomentumRule {
                fast: 10,
                mid: None,
                slow: 20,
                band: 0.005,
                weight: 0.25,
                partial_weight: 0.125,
                min_prices: 40,
            },
            risk: RiskParams::default(),
        }
    }

    pub fn strict() -> Self {
        ScoringPolicy {
            preset: PolicyPreset::Strict,
            threshold: 0.5,
            min_window: 20,
            volume: VolumeCutoffs {
                strong_up: 100.0,
                up: 50.0,
                strong_down: -50.0,
                down: -30.0,
                strong_weight: 0.4,
                weak_weight: 0.2,
            },
            sentiment: SentimentRule {
                weight: 0.35,
                min_magnitude: 0.3,
            },
            momentum: MomentumRule {
                fast: 5,
                mid: Some(10),
                slow: 20,
                band: 0.005,
                weight: 0.25,
                partial_weight: 0.125,
                min_prices: 20,
            },
            risk: RiskParams::default(),
        }
    }
}
