//! End-to-end engine tests: enrichment, simulation, and aggregation together.

mod common;

use approx::assert_relative_eq;
use common::*;
use proptest::prelude::*;
use sigtrader::domain::backtest::{BacktestConfig, run_backtest};
use sigtrader::domain::enrichment::enrich;
use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::metrics::BacktestReport;
use sigtrader::domain::policy::ScoringPolicy;
use sigtrader::domain::position::ExitOutcome;
use sigtrader::domain::signal::Direction;
use sigtrader::worker::spawn_backtest;

fn backtest(bars: &[Bar]) -> Result<BacktestReport, SigtraderError> {
    let enriched = enrich(bars, 28);
    let config = BacktestConfig::default();
    let run = run_backtest(&enriched, &ScoringPolicy::standard(), &config)?;
    Ok(BacktestReport::compute(run, config.starting_balance, &enriched))
}

mod full_backtest_pipeline {
    use super::*;

    #[test]
    fn flat_market_never_trades() {
        let report = backtest(&flat_bars(100, 100.0, 1000.0)).unwrap();
        assert_eq!(report.total_trades, 0);
        assert_eq!(report.win_rate, 0.0);
        assert_eq!(report.total_return_percent, 0.0);
        assert_eq!(report.final_balance, 10_000.0);
        assert_eq!(report.data_point_count, 100);
    }

    #[test]
    fn volume_spike_buy_then_take_profit() {
        let bars = spike_then_rally();
        let enriched = enrich(&bars, 28);
        assert_relative_eq!(enriched[60].volume_change, 100.0, epsilon = 1e-9);
        assert_eq!(enriched[60].sentiment, 0.0);
        assert_eq!(enriched[65].sentiment, 0.7);

        let report = backtest(&bars).unwrap();
        assert_eq!(report.total_trades, 1);

        let trade = &report.trades[0];
        assert_eq!(trade.position.direction(), Direction::Buy);
        assert_eq!(trade.position.entry_index, 60);
        assert_eq!(trade.position.entry_price(), 100.0);
        assert_eq!(trade.exit_index, 65);
        assert_eq!(trade.outcome, ExitOutcome::TakeProfit);
        assert_relative_eq!(trade.exit_price, 112.0, epsilon = 1e-9);
        assert_relative_eq!(trade.pnl_percent, 12.0, epsilon = 1e-9);

        assert_eq!(report.wins, 1);
        assert_eq!(report.losses, 0);
        assert_relative_eq!(report.win_rate, 100.0);
        assert_relative_eq!(report.final_balance, 11_200.0, epsilon = 1e-6);
        assert_relative_eq!(report.total_return_percent, 12.0, epsilon = 1e-9);
        assert_eq!(report.profit_factor, 0.0);
        assert_eq!(report.max_drawdown_percent, 0.0);
    }

    #[test]
    fn volume_drought_sell_then_stop_loss() {
        let mut bars = flat_bars(150, 100.0, 1000.0);
        bars[60].volume = 100.0;
        bars[63] = make_bar(63, 104.5, 1000.0);

        let report = backtest(&bars).unwrap();
        assert_eq!(report.total_trades, 1);

        let trade = &report.trades[0];
        assert_eq!(trade.position.direction(), Direction::Sell);
        assert_eq!(trade.outcome, ExitOutcome::StopLoss);
        assert_relative_eq!(trade.exit_price, 104.0, epsilon = 1e-9);
        assert_relative_eq!(trade.pnl_percent, -4.0, epsilon = 1e-9);

        assert_eq!(report.win_rate, 0.0);
        assert_relative_eq!(report.avg_loss_percent, -4.0, epsilon = 1e-9);
        assert_relative_eq!(report.final_balance, 9_600.0, epsilon = 1e-6);
        assert_relative_eq!(report.max_drawdown_percent, 4.0, epsilon = 1e-9);
        assert_eq!(report.profit_factor, 0.0);
    }

    #[test]
    fn time_range_spans_input() {
        let report = backtest(&spike_then_rally()).unwrap();
        let range = report.time_range.unwrap();
        assert_eq!(range.start, ts(0));
        assert_eq!(range.end, ts(149));
    }

    #[test]
    fn short_input_is_configuration_error() {
        let err = backtest(&flat_bars(99, 100.0, 1000.0)).unwrap_err();
        assert!(matches!(err, SigtraderError::Configuration { .. }));
    }

    #[test]
    fn strict_policy_ignores_moderate_spike() {
        // +100% volume is only "up" under the strict cutoffs: 0.2 < 0.5.
        let enriched = enrich(&spike_then_rally(), 28);
        let config = BacktestConfig::default();
        let run = run_backtest(&enriched, &ScoringPolicy::strict(), &config).unwrap();
        assert!(run.trades.is_empty());
    }
}

mod background_worker {
    use super::*;

    #[test]
    fn worker_matches_inline_run() {
        let bars = spike_then_rally();
        let inline = backtest(&bars).unwrap();

        let handle = spawn_backtest(
            enrich(&bars, 28),
            ScoringPolicy::standard(),
            BacktestConfig::default(),
        )
        .unwrap();
        let report = handle.wait().unwrap();
        assert_eq!(report, inline);
    }
}

mod invariants {
    use super::*;

    fn random_walk() -> impl Strategy<Value = Vec<Bar>> {
        prop::collection::vec((-0.03f64..0.03, 100.0f64..5_000.0), 100..220).prop_map(|steps| {
            let mut close = 100.0;
            steps
                .into_iter()
                .enumerate()
                .map(|(i, (r, volume))| {
                    close *= 1.0 + r;
                    make_bar(i, close, volume)
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn trades_are_sequential_and_consistent(bars in random_walk()) {
            let enriched = enrich(&bars, 28);
            let config = BacktestConfig::default();
            let run = run_backtest(&enriched, &ScoringPolicy::standard(), &config).unwrap();

            prop_assert_eq!(run.balance_history.len(), run.trades.len() + 1);

            let mut last_exit = 0;
            for trade in &run.trades {
                prop_assert!(trade.exit_index > trade.position.entry_index);
                prop_assert!(trade.position.entry_index >= last_exit);
                prop_assert!(trade.position.entry_index >= config.warmup);
                last_exit = trade.exit_index;
            }
            if let Some(open) = &run.open_at_end {
                prop_assert!(open.entry_index >= last_exit);
            }

            let report = BacktestReport::compute(run, config.starting_balance, &enriched);
            prop_assert_eq!(report.wins + report.losses, report.total_trades);
            prop_assert!(report.max_drawdown_percent >= 0.0);
            prop_assert!(report.profit_factor >= 0.0);
        }

        #[test]
        fn exits_fill_at_levels(bars in random_walk()) {
            let enriched = enrich(&bars, 28);
            let config = BacktestConfig::default();
            let run = run_backtest(&enriched, &ScoringPolicy::standard(), &config).unwrap();
            for trade in &run.trades {
                let expected = match trade.outcome {
                    ExitOutcome::StopLoss => trade.position.proposal.stop_loss_price,
                    ExitOutcome::TakeProfit => trade.position.proposal.take_profit_price,
                };
                prop_assert_eq!(trade.exit_price, expected);
            }
        }
    }
}
