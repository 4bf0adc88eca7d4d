//! Configuration validation.
//!
//! Checks every section before a run starts. Values are read the same way the
//! builders read them, with preset-aware defaults, so a file that passes here
//! always builds.

use crate::domain::backtest::BacktestConfig;
use crate::domain::enrichment::{DEFAULT_LOOKBACK, DEFAULT_VOLATILITY_SCALE};
use crate::domain::error::SigtraderError;
use crate::domain::live::LiveConfig;
use crate::domain::policy::{MomentumRule, PolicyPreset, ScoringPolicy};
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let lookback = validate_enrichment_config(config)?;
    let policy = validate_scoring_config(config)?;
    validate_risk_config(config)?;
    validate_backtest_config(config, &policy)?;
    validate_live_config(config, &policy, lookback)?;
    Ok(())
}

/// Validates `[enrichment]` and returns the lookback it checked.
pub fn validate_enrichment_config(config: &dyn ConfigPort) -> Result<usize, SigtraderError> {
    let lookback = read_usize(config, "enrichment", "lookback", DEFAULT_LOOKBACK)?;
    if lookback == 0 {
        return Err(SigtraderError::invalid_config(
            "enrichment",
            "lookback",
            "lookback must be at least 1",
        ));
    }
    let scale = read_f64(
        config,
        "enrichment",
        "live_volatility_scale",
        DEFAULT_VOLATILITY_SCALE,
    )?;
    if scale <= 0.0 {
        return Err(SigtraderError::invalid_config(
            "enrichment",
            "live_volatility_scale",
            "live_volatility_scale must be positive",
        ));
    }
    Ok(lookback)
}

/// Scoring preset named by `[scoring] policy`, standard when absent.
pub fn read_preset(config: &dyn ConfigPort) -> Result<PolicyPreset, SigtraderError> {
    match config.get_string("scoring", "policy") {
        None => Ok(PolicyPreset::Standard),
        Some(name) => name
            .parse()
            .map_err(|reason: String| SigtraderError::invalid_config("scoring", "policy", reason)),
    }
}

/// Validates `[scoring]` and returns the effective policy values it checked.
pub fn validate_scoring_config(config: &dyn ConfigPort) -> Result<ScoringPolicy, SigtraderError> {
    let base = ScoringPolicy::from_preset(read_preset(config)?);

    let threshold = read_f64(config, "scoring", "threshold", base.threshold)?;
    if threshold <= 0.0 {
        return Err(SigtraderError::invalid_config(
            "scoring",
            "threshold",
            "threshold must be positive",
        ));
    }

    let min_window = read_usize(config, "scoring", "min_window", base.min_window)?;
    if min_window == 0 {
        return Err(SigtraderError::invalid_config(
            "scoring",
            "min_window",
            "min_window must be at least 1",
        ));
    }

    let strong_up = read_f64(config, "scoring", "volume_strong_up", base.volume.strong_up)?;
    let up = read_f64(config, "scoring", "volume_up", base.volume.up)?;
    if strong_up < up {
        return Err(SigtraderError::invalid_config(
            "scoring",
            "volume_strong_up",
            "volume_strong_up must not be below volume_up",
        ));
    }
    let strong_down = read_f64(
        config,
        "scoring",
        "volume_strong_down",
        base.volume.strong_down,
    )?;
    let down = read_f64(config, "scoring", "volume_down", base.volume.down)?;
    if strong_down > down {
        return Err(SigtraderError::invalid_config(
            "scoring",
            "volume_strong_down",
            "volume_strong_down must not be above volume_down",
        ));
    }

    for (key, default) in [
        ("volume_strong_weight", base.volume.strong_weight),
        ("volume_weak_weight", base.volume.weak_weight),
        ("sentiment_weight", base.sentiment.weight),
        ("sentiment_min_magnitude", base.sentiment.min_magnitude),
        ("momentum_band", base.momentum.band),
        ("momentum_weight", base.momentum.weight),
        ("momentum_partial_weight", base.momentum.partial_weight),
    ] {
        if read_f64(config, "scoring", key, default)? < 0.0 {
            return Err(SigtraderError::invalid_config(
                "scoring",
                key,
                format!("{key} must be non-negative"),
            ));
        }
    }

    let fast = read_usize(config, "scoring", "momentum_fast", base.momentum.fast)?;
    let slow = read_usize(config, "scoring", "momentum_slow", base.momentum.slow)?;
    let mid = read_usize(
        config,
        "scoring",
        "momentum_mid",
        base.momentum.mid.unwrap_or(0),
    )?;
    if fast == 0 {
        return Err(SigtraderError::invalid_config(
            "scoring",
            "momentum_fast",
            "momentum_fast must be at least 1",
        ));
    }
    if fast >= slow {
        return Err(SigtraderError::invalid_config(
            "scoring",
            "momentum_fast",
            "momentum_fast must be shorter than momentum_slow",
        ));
    }
    if mid != 0 && (mid <= fast || mid >= slow) {
        return Err(SigtraderError::invalid_config(
            "scoring",
            "momentum_mid",
            "momentum_mid must lie between momentum_fast and momentum_slow",
        ));
    }
    let min_prices = read_usize(
        config,
        "scoring",
        "momentum_min_prices",
        base.momentum.min_prices,
    )?;
    if min_prices < slow {
        return Err(SigtraderError::invalid_config(
            "scoring",
            "momentum_min_prices",
            "momentum_min_prices must cover momentum_slow",
        ));
    }

    Ok(ScoringPolicy {
        threshold,
        min_window,
        momentum: MomentumRule {
            fast,
            mid: (mid > 0).then_some(mid),
            slow,
            min_prices,
            ..base.momentum
        },
        ..base
    })
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let base = ScoringPolicy::from_preset(read_preset(config)?).risk;
    for (key, default) in [
        ("stop_loss_pct", base.stop_loss_pct),
        ("take_profit_pct", base.take_profit_pct),
    ] {
        let value = read_f64(config, "risk", key, default)?;
        if value <= 0.0 || value >= 100.0 {
            return Err(SigtraderError::invalid_config(
                "risk",
                key,
                format!("{key} must be between 0 and 100"),
            ));
        }
    }
    Ok(())
}

pub fn validate_backtest_config(
    config: &dyn ConfigPort,
    policy: &ScoringPolicy,
) -> Result<(), SigtraderError> {
    let base = BacktestConfig::default();

    let balance = read_f64(config, "backtest", "starting_balance", base.starting_balance)?;
    if balance <= 0.0 {
        return Err(SigtraderError::invalid_config(
            "backtest",
            "starting_balance",
            "starting_balance must be positive",
        ));
    }

    let warmup = read_usize(config, "backtest", "warmup", base.warmup)?;
    let history_window = read_usize(config, "backtest", "history_window", base.history_window)?;
    if history_window == 0 {
        return Err(SigtraderError::invalid_config(
            "backtest",
            "history_window",
            "history_window must be at least 1",
        ));
    }
    check_window_covers_policy("backtest", "history_window", history_window, policy)?;

    let min_bars = read_usize(config, "backtest", "min_bars", base.min_bars)?;
    if min_bars < warmup {
        return Err(SigtraderError::invalid_config(
            "backtest",
            "min_bars",
            "min_bars must be at least warmup",
        ));
    }
    Ok(())
}

pub fn validate_live_config(
    config: &dyn ConfigPort,
    policy: &ScoringPolicy,
    lookback: usize,
) -> Result<(), SigtraderError> {
    let base = LiveConfig::default();

    let signal_window = read_usize(config, "live", "signal_window", base.signal_window)?;
    if signal_window == 0 {
        return Err(SigtraderError::invalid_config(
            "live",
            "signal_window",
            "signal_window must be at least 1",
        ));
    }
    check_window_covers_policy("live", "signal_window", signal_window, policy)?;

    let capacity = read_usize(config, "live", "buffer_capacity", base.buffer_capacity)?;
    if capacity < signal_window {
        return Err(SigtraderError::invalid_config(
            "live",
            "buffer_capacity",
            "buffer_capacity must hold at least signal_window bars",
        ));
    }
    if capacity <= lookback {
        return Err(SigtraderError::invalid_config(
            "live",
            "buffer_capacity",
            format!("buffer_capacity must exceed the enrichment lookback ({lookback})"),
        ));
    }
    Ok(())
}

/// A scoring window shorter than `min_window` never signals, and one shorter
/// than `momentum_min_prices` never scores momentum.
fn check_window_covers_policy(
    section: &str,
    key: &str,
    window: usize,
    policy: &ScoringPolicy,
) -> Result<(), SigtraderError> {
    if window < policy.min_window {
        return Err(SigtraderError::invalid_config(
            section,
            key,
            format!("{key} must be at least min_window ({})", policy.min_window),
        ));
    }
    if window < policy.momentum.min_prices {
        return Err(SigtraderError::invalid_config(
            section,
            key,
            format!(
                "{key} must be at least momentum_min_prices ({})",
                policy.momentum.min_prices
            ),
        ));
    }
    Ok(())
}

/// Present-but-unparsable is an error here, where getters would fall back silently.
fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, SigtraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(SigtraderError::invalid_config(
                section,
                key,
                format!("'{raw}' is not a number"),
            )),
        },
    }
}

fn read_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, SigtraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
            SigtraderError::invalid_config(
                section,
                key,
                format!("'{raw}' is not a non-negative integer"),
            )
        }),
    }
}
