//! Signal scoring: weighted volume, sentiment, and momentum terms.
//!
//! The scorer is a pure function of (current bar, trailing window, policy).
//! It never errors; a window shorter than the policy minimum is "no signal".

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::bar::EnrichedBar;
use crate::domain::error::SigtraderError;
use crate::domain::indicator::sma;
use crate::domain::policy::{MomentumRule, RiskParams, ScoringPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Volume,
    Sentiment,
    Momentum,
}

/// One feature's share of the score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub feature: Feature,
    /// Feature input: volume change %, sentiment, or fast/slow SMA spread %.
    pub input: f64,
    pub points: f64,
}

impl fmt::Display for Contribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.feature {
            Feature::Volume => write!(f, "volume change {:+.1}%", self.input)?,
            Feature::Sentiment => write!(f, "sentiment {:+.2}", self.input)?,
            Feature::Momentum => write!(f, "sma spread {:+.2}%", self.input)?,
        }
        write!(f, " -> {:+.3}", self.points)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalProposal {
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
    pub score: f64,
    pub rationale: Vec<Contribution>,
}

impl SignalProposal {
    /// Entry at `entry`, stop and target placed per `risk`.
    pub fn at_entry(direction: Direction, entry: f64, risk: &RiskParams, score: f64) -> Self {
        let sl = risk.stop_loss_pct;
        let tp = risk.take_profit_pct;
        let (stop_loss_price, take_profit_price) = match direction {
            Direction::Buy => (entry * (100.0 - sl) / 100.0, entry * (100.0 + tp) / 100.0),
            Direction::Sell => (entry * (100.0 + sl) / 100.0, entry * (100.0 - tp) / 100.0),
        };
        SignalProposal {
            direction,
            entry_price: entry,
            stop_loss_price,
            take_profit_price,
            score,
            rationale: Vec::new(),
        }
    }

    /// Reward distance over risk distance.
    pub fn risk_reward(&self) -> f64 {
        let risk = (self.entry_price - self.stop_loss_price).abs();
        if risk > 0.0 {
            (self.take_profit_price - self.entry_price).abs() / risk
        } else {
            0.0
        }
    }
}

/// Score and per-feature breakdown, before the threshold is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub score: f64,
    pub contributions: Vec<Contribution>,
}

/// Compute the weighted score. `None` when the window is below the policy minimum.
pub fn score_breakdown(
    current: &EnrichedBar,
    window: &[EnrichedBar],
    policy: &ScoringPolicy,
) -> Option<ScoreBreakdown> {
    if window.len() < policy.min_window {
        return None;
    }

    let volume = Contribution {
        feature: Feature::Volume,
        input: current.volume_change,
        points: policy.volume.contribution(current.volume_change),
    };
    let sentiment = Contribution {
        feature: Feature::Sentiment,
        input: current.sentiment,
        points: policy.sentiment.contribution(current.sentiment),
    };
    let (spread, momentum_points) = momentum(window, &policy.momentum);
    let momentum = Contribution {
        feature: Feature::Momentum,
        input: spread,
        points: momentum_points,
    };

    let score = volume.points + sentiment.points + momentum.points;
    Some(ScoreBreakdown {
        score,
        contributions: vec![volume, sentiment, momentum],
    })
}

/// Score the current bar; a proposal only when the score clears the threshold.
pub fn score(
    current: &EnrichedBar,
    window: &[EnrichedBar],
    policy: &ScoringPolicy,
) -> Option<SignalProposal> {
    let breakdown = score_breakdown(current, window, policy)?;

    let direction = if breakdown.score > policy.threshold {
        Direction::Buy
    } else if breakdown.score < -policy.threshold {
        Direction::Sell
    } else {
        return None;
    };

    let mut proposal =
        SignalProposal::at_entry(direction, current.close(), &policy.risk, breakdown.score);
    proposal.rationale = breakdown.contributions;
    Some(proposal)
}

/// Returns (fast/slow spread in percent, points).
fn momentum(window: &[EnrichedBar], rule: &MomentumRule) -> (f64, f64) {
    if window.len() < rule.min_prices {
        return (0.0, 0.0);
    }
    let prices: Vec<f64> = window[window.len() - rule.min_prices..]
        .iter()
        .map(EnrichedBar::close)
        .collect();

    let (Some(fast), Some(slow)) = (sma(&prices, rule.fast), sma(&prices, rule.slow)) else {
        return (0.0, 0.0);
    };
    let spread = if slow > 0.0 {
        (fast / slow - 1.0) * 100.0
    } else {
        0.0
    };

    let above = |a: f64, b: f64| a > b * (1.0 + rule.band);
    let below = |a: f64, b: f64| a < b * (1.0 - rule.band);

    let points = match rule.mid.and_then(|p| sma(&prices, p)) {
        None => {
            if above(fast, slow) {
                rule.weight
            } else if below(fast, slow) {
                -rule.weight
            } else {
                0.0
            }
        }
        Some(mid) => {
            if above(fast, mid) && above(mid, slow) {
                rule.weight
            } else if below(fast, mid) && below(mid, slow) {
                -rule.weight
            } else if above(fast, slow) {
                rule.partial_weight
            } else if below(fast, slow) {
                -rule.partial_weight
            } else {
                0.0
            }
        }
    };
    (spread, points)
}

/// Why no trade is proposed right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HoldReason {
    AwaitingData { have: usize, need: usize },
    NoSetup,
}

impl fmt::Display for HoldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoldReason::AwaitingData { have, need } => {
                write!(f, "waiting for data ({have} of {need} bars)")
            }
            HoldReason::NoSetup => write!(f, "no clear signal, waiting for a better setup"),
        }
    }
}

/// A proposal tagged with the bar and features it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentSignal {
    pub proposal: SignalProposal,
    pub timestamp: NaiveDateTime,
    pub volume_change: f64,
    pub sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "signal", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Trade(CurrentSignal),
    Hold { reason: HoldReason },
}

impl Signal {
    pub fn is_hold(&self) -> bool {
        matches!(self, Signal::Hold { .. })
    }
}

/// Evaluate the most recent bar of a snapshot.
///
/// The last `window_len` bars form the window, and the last of those is the
/// current bar. Fewer bars than `window_len` is an `InsufficientData` error.
pub fn latest_signal(
    bars: &[EnrichedBar],
    window_len: usize,
    policy: &ScoringPolicy,
) -> Result<Signal, SigtraderError> {
    if window_len == 0 || bars.len() < window_len {
        return Err(SigtraderError::InsufficientData {
            have: bars.len(),
            need: window_len.max(1),
        });
    }
    let window = &bars[bars.len() - window_len..];
    let current = &window[window.len() - 1];

    Ok(match score(current, window, policy) {
        Some(proposal) => Signal::Trade(CurrentSignal {
            proposal,
            timestamp: current.timestamp(),
            volume_change: current.volume_change,
            sentiment: current.sentiment,
        }),
        None => Signal::Hold {
            reason: HoldReason::NoSetup,
        },
    })
}

/// Like [`latest_signal`], with missing history reported as a hold.
pub fn current_signal(bars: &[EnrichedBar], window_len: usize, policy: &ScoringPolicy) -> Signal {
    match latest_signal(bars, window_len, policy) {
        Ok(signal) => signal,
        Err(SigtraderError::InsufficientData { have, need }) => Signal::Hold {
            reason: HoldReason::AwaitingData { have, need },
        },
        Err(_) => Signal::Hold {
            reason: HoldReason::NoSetup,
        },
    }
}
