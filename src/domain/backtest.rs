//! Backtest simulator: replays the scorer over a bar sequence with one
//! position at a time.
//!
//! Per bar i (from `warmup` on):
//! 1. if open, check stop-loss then take-profit against close[i]; a hit closes
//!    at the level price and compounds the balance;
//! 2. if flat (including just closed), score bar i against the previous
//!    `history_window` bars and open on a proposal.
//!
//! A position opened at i can close at i+1 at the earliest. A position still
//! open when the bars run out is not closed and not reported as a trade.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::domain::bar::EnrichedBar;
use crate::domain::error::SigtraderError;
use crate::domain::policy::ScoringPolicy;
use crate::domain::position::{ClosedTrade, OpenPosition, PositionState};
use crate::domain::signal;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub starting_balance: f64,
    /// First bar index evaluated.
    pub warmup: usize,
    /// Bars before the current one handed to the scorer.
    pub history_window: usize,
    /// Shorter sequences are refused.
    pub min_bars: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            starting_balance: 10_000.0,
            warmup: 50,
            history_window: 50,
            min_bars: 100,
        }
    }
}

/// Raw outcome of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRun {
    pub trades: Vec<ClosedTrade>,
    /// Balance before any trade, then after each closed trade, in order.
    pub balance_history: Vec<f64>,
    pub final_balance: f64,
    pub open_at_end: Option<OpenPosition>,
}

/// Bar-by-bar driver. Owns the position state and trade log for one run.
#[derive(Debug)]
pub struct Simulator<'a> {
    policy: &'a ScoringPolicy,
    config: &'a BacktestConfig,
    state: PositionState,
    balance: f64,
    trades: Vec<ClosedTrade>,
    balance_history: Vec<f64>,
}

impl<'a> Simulator<'a> {
    pub fn new(policy: &'a ScoringPolicy, config: &'a BacktestConfig) -> Self {
        Simulator {
            policy,
            config,
            state: PositionState::Flat,
            balance: config.starting_balance,
            trades: Vec::new(),
            balance_history: vec![config.starting_balance],
        }
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn trades(&self) -> &[ClosedTrade] {
        &self.trades
    }

    /// Process bar `index` of `bars`. Bars must be stepped in increasing order.
    pub fn step(&mut self, bars: &[EnrichedBar], index: usize) {
        let current = &bars[index];

        let exit = self
            .state
            .position()
            .and_then(|p| p.check_exit(current.close()));
        if let Some((outcome, exit_price)) = exit {
            if let PositionState::Open(position) = std::mem::take(&mut self.state) {
                let trade = position.close(outcome, exit_price, current.timestamp(), index);
                self.balance *= 1.0 + trade.pnl_percent / 100.0;
                self.balance_history.push(self.balance);
                debug!(
                    index,
                    outcome = ?trade.outcome,
                    exit_price,
                    pnl_percent = trade.pnl_percent,
                    balance = self.balance,
                    "position closed"
                );
                self.trades.push(trade);
            }
        }

        if self.state.is_flat() {
            let window = &bars[index.saturating_sub(self.config.history_window)..index];
            if let Some(proposal) = signal::score(current, window, self.policy) {
                debug!(
                    index,
                    direction = %proposal.direction,
                    entry = proposal.entry_price,
                    score = proposal.score,
                    "position opened"
                );
                self.state = PositionState::Open(OpenPosition {
                    proposal,
                    entry_timestamp: current.timestamp(),
                    entry_index: index,
                    entry_volume_change: current.volume_change,
                    entry_sentiment: current.sentiment,
                });
            }
        }
    }

    pub fn finish(self) -> BacktestRun {
        BacktestRun {
            trades: self.trades,
            balance_history: self.balance_history,
            final_balance: self.balance,
            open_at_end: match self.state {
                PositionState::Flat => None,
                PositionState::Open(p) => Some(p),
            },
        }
    }
}

pub fn run_backtest(
    bars: &[EnrichedBar],
    policy: &ScoringPolicy,
    config: &BacktestConfig,
) -> Result<BacktestRun, SigtraderError> {
    run_backtest_cancellable(bars, policy, config, &AtomicBool::new(false))
}

/// Run the simulation, polling `cancel` before every bar.
pub fn run_backtest_cancellable(
    bars: &[EnrichedBar],
    policy: &ScoringPolicy,
    config: &BacktestConfig,
    cancel: &AtomicBool,
) -> Result<BacktestRun, SigtraderError> {
    if bars.len() < config.min_bars {
        return Err(SigtraderError::Configuration {
            reason: format!(
                "need at least {} bars, have {}",
                config.min_bars,
                bars.len()
            ),
        });
    }

    info!(
        bars = bars.len(),
        warmup = config.warmup,
        threshold = policy.threshold,
        "running backtest"
    );

    let mut sim = Simulator::new(policy, config);
    for index in config.warmup..bars.len() {
        if cancel.load(Ordering::Relaxed) {
            return Err(SigtraderError::Cancelled);
        }
        sim.step(bars, index);
    }

    let run = sim.finish();
    if let Some(open) = &run.open_at_end {
        debug!(
            entry_index = open.entry_index,
            "position still open at end of data, excluded from trades"
        );
    }
    info!(
        trades = run.trades.len(),
        final_balance = run.final_balance,
        "backtest finished"
    );
    Ok(run)
}
