//! CLI definition and dispatch.

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{CsvAdapter, parse_timestamp};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::adapters::notifier::{ConsoleNotifier, DedupNotifier};
use crate::domain::backtest::BacktestConfig;
use crate::domain::bar::PricePoint;
use crate::domain::config_validation::{read_preset, validate_config};
use crate::domain::enrichment::{
    DEFAULT_LOOKBACK, DEFAULT_VOLATILITY_SCALE, EnrichmentConfig, enrich,
};
use crate::domain::error::SigtraderError;
use crate::domain::live::{LiveConfig, LiveFeed};
use crate::domain::metrics::BacktestReport;
use crate::domain::policy::{
    MomentumRule, RiskParams, ScoringPolicy, SentimentRule, VolumeCutoffs,
};
use crate::domain::signal::{Signal, current_signal};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::notify_port::NotifyPort;
use crate::ports::report_port::ReportPort;
use crate::worker::spawn_backtest;

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "BTC signal scoring and backtesting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over a CSV of OHLCV bars
    Backtest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: PathBuf,
        /// Write the full report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate the signal at the last bar of a CSV
    Signal {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: PathBuf,
    },
    /// Read `timestamp,price` lines from stdin and alert on new signals
    Live {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// CSV of bars to prefill the buffer with
        #[arg(long)]
        seed: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Everything a command needs from the configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub enrichment: EnrichmentConfig,
    pub policy: ScoringPolicy,
    pub backtest: BacktestConfig,
    pub live: LiveConfig,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            data,
            output,
        } => run_backtest(config.as_ref(), &data, output.as_deref()),
        Command::Signal { config, data } => run_signal(config.as_ref(), &data),
        Command::Live { config, seed } => run_live(config.as_ref(), seed.as_ref()),
        Command::Validate { config } => run_validate(&config),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load and validate settings. No path means every default.
pub fn load_config(path: Option<&PathBuf>) -> Result<Settings, SigtraderError> {
    let adapter = match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path)?
        }
        None => FileConfigAdapter::empty(),
    };
    build_settings(&adapter)
}

pub fn build_settings(adapter: &dyn ConfigPort) -> Result<Settings, SigtraderError> {
    validate_config(adapter)?;
    Ok(Settings {
        enrichment: build_enrichment_config(adapter),
        policy: build_scoring_policy(adapter)?,
        backtest: build_backtest_config(adapter),
        live: build_live_config(adapter),
    })
}

pub fn build_enrichment_config(adapter: &dyn ConfigPort) -> EnrichmentConfig {
    EnrichmentConfig {
        lookback: adapter.get_usize("enrichment", "lookback", DEFAULT_LOOKBACK),
        live_volatility_scale: adapter.get_double(
            "enrichment",
            "live_volatility_scale",
            DEFAULT_VOLATILITY_SCALE,
        ),
    }
}

/// Named preset with any individually configured keys laid over it.
pub fn build_scoring_policy(adapter: &dyn ConfigPort) -> Result<ScoringPolicy, SigtraderError> {
    let base = ScoringPolicy::from_preset(read_preset(adapter)?);
    let s = "scoring";

    let mid = adapter.get_usize(s, "momentum_mid", base.momentum.mid.unwrap_or(0));

    Ok(ScoringPolicy {
        preset: base.preset,
        threshold: adapter.get_double(s, "threshold", base.threshold),
        min_window: adapter.get_usize(s, "min_window", base.min_window),
        volume: VolumeCutoffs {
            strong_up: adapter.get_double(s, "volume_strong_up", base.volume.strong_up),
            up: adapter.get_double(s, "volume_up", base.volume.up),
            strong_down: adapter.get_double(s, "volume_strong_down", base.volume.strong_down),
            down: adapter.get_double(s, "volume_down", base.volume.down),
            strong_weight: adapter.get_double(s, "volume_strong_weight", base.volume.strong_weight),
            weak_weight: adapter.get_double(s, "volume_weak_weight", base.volume.weak_weight),
        },
        sentiment: SentimentRule {
            weight: adapter.get_double(s, "sentiment_weight", base.sentiment.weight),
            min_magnitude: adapter.get_double(
                s,
                "sentiment_min_magnitude",
                base.sentiment.min_magnitude,
            ),
        },
        momentum: MomentumRule {
            fast: adapter.get_usize(s, "momentum_fast", base.momentum.fast),
            mid: (mid > 0).then_some(mid),
            slow: adapter.get_usize(s, "momentum_slow", base.momentum.slow),
            band: adapter.get_double(s, "momentum_band", base.momentum.band),
            weight: adapter.get_double(s, "momentum_weight", base.momentum.weight),
            partial_weight: adapter.get_double(
                s,
                "momentum_partial_weight",
                base.momentum.partial_weight,
            ),
            min_prices: adapter.get_usize(s, "momentum_min_prices", base.momentum.min_prices),
        },
        risk: RiskParams {
            stop_loss_pct: adapter.get_double("risk", "stop_loss_pct", base.risk.stop_loss_pct),
            take_profit_pct: adapter.get_double(
                "risk",
                "take_profit_pct",
                base.risk.take_profit_pct,
            ),
        },
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> BacktestConfig {
    let base = BacktestConfig::default();
    BacktestConfig {
        starting_balance: adapter.get_double("backtest", "starting_balance", base.starting_balance),
        warmup: adapter.get_usize("backtest", "warmup", base.warmup),
        history_window: adapter.get_usize("backtest", "history_window", base.history_window),
        min_bars: adapter.get_usize("backtest", "min_bars", base.min_bars),
    }
}

pub fn build_live_config(adapter: &dyn ConfigPort) -> LiveConfig {
    let base = LiveConfig::default();
    LiveConfig {
        signal_window: adapter.get_usize("live", "signal_window", base.signal_window),
        buffer_capacity: adapter.get_usize("live", "buffer_capacity", base.buffer_capacity),
    }
}

fn run_backtest(
    config_path: Option<&PathBuf>,
    data_path: &Path,
    output_path: Option<&Path>,
) -> Result<(), SigtraderError> {
    let settings = load_config(config_path)?;
    let data_port = CsvAdapter::new(data_path.to_path_buf());
    let report = run_backtest_pipeline(&data_port, &settings)?;
    print_summary(&report);

    if let Some(output) = output_path {
        JsonReportAdapter::new().write(&report, output)?;
        eprintln!("\nReport written to: {}", output.display());
    }
    Ok(())
}

/// Load, enrich, and simulate on the worker thread.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    settings: &Settings,
) -> Result<BacktestReport, SigtraderError> {
    let loaded = data_port.load_bars()?;
    eprintln!(
        "Loaded {} bars ({} rows skipped)",
        loaded.bars.len(),
        loaded.rejected.len()
    );
    if let Some((start, end)) = loaded.time_range() {
        eprintln!("  Range: {start} to {end}");
    }

    let enriched = enrich(&loaded.bars, settings.enrichment.lookback);
    eprintln!(
        "Running backtest: {} policy, threshold {}",
        settings.policy.preset, settings.policy.threshold
    );

    let handle = spawn_backtest(enriched, settings.policy.clone(), settings.backtest.clone())?;
    handle.wait()
}

pub fn print_summary(report: &BacktestReport) {
    eprintln!("\n=== Backtest Results ===");
    eprintln!("Total Return:     {:.2}%", report.total_return_percent);
    eprintln!(
        "Final Balance:    ${:.2} (from ${:.2})",
        report.final_balance, report.starting_balance
    );
    eprintln!("Max Drawdown:     -{:.2}%", report.max_drawdown_percent);
    eprintln!("Total Trades:     {}", report.total_trades);
    eprintln!("Wins / Losses:    {} / {}", report.wins, report.losses);
    eprintln!("Win Rate:         {:.1}%", report.win_rate);
    eprintln!("Avg Win:          {:.2}%", report.avg_win_percent);
    eprintln!("Avg Loss:         {:.2}%", report.avg_loss_percent);
    eprintln!("Profit Factor:    {:.2}", report.profit_factor);

    if !report.trades.is_empty() {
        eprintln!("\n=== Recent Trades ===");
        for t in report.trades.iter().rev().take(10) {
            let sign = if t.pnl_percent >= 0.0 { "+" } else { "" };
            eprintln!(
                "  {} {} @ {:.2} -> {:.2} ({:?}) {}{:.2}%",
                t.position.entry_timestamp,
                t.position.direction(),
                t.position.entry_price(),
                t.exit_price,
                t.outcome,
                sign,
                t.pnl_percent,
            );
        }
    }
}

fn run_signal(config_path: Option<&PathBuf>, data_path: &Path) -> Result<(), SigtraderError> {
    let settings = load_config(config_path)?;
    let data_port = CsvAdapter::new(data_path.to_path_buf());
    let signal = evaluate_signal(&data_port, &settings)?;

    let mut notifier = DedupNotifier::new(ConsoleNotifier::new(io::stderr()));
    if !notifier.dispatch(&signal)? {
        print_hold(&signal);
    }
    Ok(())
}

/// Current signal at the last loaded bar.
pub fn evaluate_signal(
    data_port: &dyn DataPort,
    settings: &Settings,
) -> Result<Signal, SigtraderError> {
    let loaded = data_port.load_bars()?;
    let enriched = enrich(&loaded.bars, settings.enrichment.lookback);
    Ok(current_signal(
        &enriched,
        settings.live.signal_window,
        &settings.policy,
    ))
}

fn print_hold(signal: &Signal) {
    if let Signal::Hold { reason } = signal {
        eprintln!("HOLD: {reason}");
    }
}

fn run_live(
    config_path: Option<&PathBuf>,
    seed_path: Option<&PathBuf>,
) -> Result<(), SigtraderError> {
    let settings = load_config(config_path)?;

    let mut feed = match seed_path {
        Some(path) => {
            let loaded = CsvAdapter::new(path.clone()).load_bars()?;
            eprintln!("Seeded live buffer with {} bars", loaded.bars.len());
            LiveFeed::with_history(settings.live.buffer_capacity, &loaded.bars)
        }
        None => LiveFeed::new(settings.live.buffer_capacity),
    };

    let mut notifier = DedupNotifier::new(ConsoleNotifier::new(io::stderr()));
    eprintln!("Reading prices from stdin (timestamp,price per line)");
    let sent = run_live_stream(io::stdin().lock(), &mut feed, &settings, &mut notifier)?;
    eprintln!("Input closed; {sent} signals sent");
    Ok(())
}

/// Feed each line into the buffer and dispatch the resulting signal.
/// Unreadable or rejected observations are logged and skipped.
pub fn run_live_stream<R: BufRead, N: NotifyPort>(
    input: R,
    feed: &mut LiveFeed,
    settings: &Settings,
    notifier: &mut DedupNotifier<N>,
) -> Result<usize, SigtraderError> {
    let mut sent = 0;
    for (i, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let point = match parse_price_line(&line) {
            Ok(p) => p,
            Err(reason) => {
                tracing::warn!(line = i + 1, %reason, "skipping price line");
                continue;
            }
        };
        if let Err(e) = feed.push(point) {
            tracing::warn!(line = i + 1, error = %e, "observation rejected");
            continue;
        }
        let signal = feed.current_signal(&settings.enrichment, &settings.live, &settings.policy);
        if notifier.dispatch(&signal)? {
            sent += 1;
        }
    }
    Ok(sent)
}

/// `timestamp,price`, or a bare price stamped with the current time.
pub fn parse_price_line(line: &str) -> Result<PricePoint, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let (timestamp, price) = match fields.as_slice() {
        [price] => (Utc::now().naive_utc(), *price),
        [ts, price] => (parse_timestamp(ts)?, *price),
        _ => return Err(format!("expected 'timestamp,price', got '{line}'")),
    };
    let price: f64 = price
        .parse()
        .map_err(|e| format!("invalid price '{price}': {e}"))?;
    Ok(PricePoint { timestamp, price })
}

fn run_validate(config_path: &PathBuf) -> Result<(), SigtraderError> {
    let settings = load_config(Some(config_path))?;
    eprintln!("Config validated successfully");
    eprintln!("\nScoring:");
    eprintln!("  policy:    {}", settings.policy.preset);
    eprintln!("  threshold: {}", settings.policy.threshold);
    eprintln!(
        "  risk:      stop {}% / target {}% (1:{:.1})",
        settings.policy.risk.stop_loss_pct,
        settings.policy.risk.take_profit_pct,
        settings.policy.risk.risk_reward()
    );
    eprintln!("\nEnrichment lookback: {}", settings.enrichment.lookback);
    eprintln!(
        "Backtest: balance {:.2}, warmup {}, window {}, min bars {}",
        settings.backtest.starting_balance,
        settings.backtest.warmup,
        settings.backtest.history_window,
        settings.backtest.min_bars
    );
    eprintln!(
        "Live: signal window {}, buffer {}",
        settings.live.signal_window, settings.live.buffer_capacity
    );
    Ok(())
}
