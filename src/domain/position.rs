//! Single-position lifecycle: open proposal, exit checks, closed trades.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::signal::{Direction, SignalProposal};

/// A proposal that has been acted on inside a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenPosition {
    pub proposal: SignalProposal,
    pub entry_timestamp: NaiveDateTime,
    pub entry_index: usize,
    pub entry_volume_change: f64,
    pub entry_sentiment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitOutcome {
    StopLoss,
    TakeProfit,
}

impl OpenPosition {
    pub fn direction(&self) -> Direction {
        self.proposal.direction
    }

    pub fn entry_price(&self) -> f64 {
        self.proposal.entry_price
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        match self.direction() {
            Direction::Buy => price <= self.proposal.stop_loss_price,
            Direction::Sell => price >= self.proposal.stop_loss_price,
        }
    }

    pub fn should_take_profit(&self, price: f64) -> bool {
        match self.direction() {
            Direction::Buy => price >= self.proposal.take_profit_price,
            Direction::Sell => price <= self.proposal.take_profit_price,
        }
    }

    /// Exit triggered by `price`, if any, and the level it fills at.
    /// Stop-loss takes priority; take-profit is only checked when it did not fire.
    pub fn check_exit(&self, price: f64) -> Option<(ExitOutcome, f64)> {
        if self.should_stop_loss(price) {
            Some((ExitOutcome::StopLoss, self.proposal.stop_loss_price))
        } else if self.should_take_profit(price) {
            Some((ExitOutcome::TakeProfit, self.proposal.take_profit_price))
        } else {
            None
        }
    }

    /// Signed percent return of exiting at `exit_price`; favourable moves are positive.
    pub fn pnl_percent(&self, exit_price: f64) -> f64 {
        let entry = self.entry_price();
        match self.direction() {
            Direction::Buy => (exit_price - entry) / entry * 100.0,
            Direction::Sell => (entry - exit_price) / entry * 100.0,
        }
    }

    pub fn close(
        self,
        outcome: ExitOutcome,
        exit_price: f64,
        exit_timestamp: NaiveDateTime,
        exit_index: usize,
    ) -> ClosedTrade {
        let pnl_percent = self.pnl_percent(exit_price);
        ClosedTrade {
            position: self,
            exit_price,
            exit_timestamp,
            exit_index,
            pnl_percent,
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedTrade {
    #[serde(flatten)]
    pub position: OpenPosition,
    pub exit_price: f64,
    pub exit_timestamp: NaiveDateTime,
    pub exit_index: usize,
    pub pnl_percent: f64,
    pub outcome: ExitOutcome,
}

impl ClosedTrade {
    pub fn is_win(&self) -> bool {
        self.outcome == ExitOutcome::TakeProfit
    }
}

/// Simulator position state. At most one position is ever held.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Open(OpenPosition),
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }

    pub fn position(&self) -> Option<&OpenPosition> {
        match self {
            PositionState::Flat => None,
            PositionState::Open(p) => Some(p),
        }
    }
}
