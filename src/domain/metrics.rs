//! Performance aggregation over a finished backtest run.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::backtest::BacktestRun;
use super::bar::EnrichedBar;
use super::position::ClosedTrade;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_return_percent: f64,
    pub starting_balance: f64,
    pub final_balance: f64,
    pub avg_win_percent: f64,
    pub avg_loss_percent: f64,
    pub profit_factor: f64,
    pub max_drawdown_percent: f64,
    pub trades: Vec<ClosedTrade>,
    pub data_point_count: usize,
    pub time_range: Option<TimeRange>,
}

impl BacktestReport {
    /// Reduce a run into summary statistics. `bars` is the sequence the run was driven over.
    pub fn compute(run: BacktestRun, starting_balance: f64, bars: &[EnrichedBar]) -> Self {
        let trades = run.trades;

        let total_trades = trades.len();
        let wins = trades.iter().filter(|t| t.is_win()).count();
        let losses = total_trades - wins;

        let win_rate = if total_trades > 0 {
            wins as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let total_return_percent = if starting_balance > 0.0 {
            (run.final_balance - starting_balance) / starting_balance * 100.0
        } else {
            0.0
        };

        let avg_win_percent = mean_pnl(&trades, true);
        let avg_loss_percent = mean_pnl(&trades, false);

        let profit_factor = if avg_loss_percent != 0.0 {
            (avg_win_percent / avg_loss_percent).abs()
        } else {
            0.0
        };

        let time_range = match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some(TimeRange {
                start: first.timestamp(),
                end: last.timestamp(),
            }),
            _ => None,
        };

        BacktestReport {
            total_trades,
            wins,
            losses,
            win_rate,
            total_return_percent,
            starting_balance,
            final_balance: run.final_balance,
            avg_win_percent,
            avg_loss_percent,
            profit_factor,
            max_drawdown_percent: max_drawdown(&run.balance_history),
            trades,
            data_point_count: bars.len(),
            time_range,
        }
    }
}

/// Mean pnl over the winning trades, or over the losing ones.
fn mean_pnl(trades: &[ClosedTrade], wins: bool) -> f64 {
    let (sum, n) = trades
        .iter()
        .filter(|t| t.is_win() == wins)
        .fold((0.0_f64, 0usize), |(sum, n), t| (sum + t.pnl_percent, n + 1));
    if n > 0 { sum / n as f64 } else { 0.0 }
}

/// Largest peak-to-trough decline, in percent of the peak, over a balance trajectory.
pub fn max_drawdown(balances: &[f64]) -> f64 {
    let Some(&first) = balances.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &balance in balances {
        if balance > peak {
            peak = balance;
        }
        if peak > 0.0 {
            let dd = (peak - balance) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}
