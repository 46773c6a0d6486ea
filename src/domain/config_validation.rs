//! Configuration validation.
//!
//! Every key is optional; present values must parse and fall inside their
//! allowed range. Runs before any data is loaded.

use crate::domain::error::MeanrevError;
use crate::domain::timeframe::Timeframe;
use crate::ports::config_port::ConfigPort;

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    let period = validate_positive_int(config, "period", 60)?;
    validate_positive_int(config, "dupe_period", period)?;
    validate_fast_period(config, period)?;
    validate_positive_int(config, "signal_period", (period / 3).max(1))?;
    validate_devfactor(config)?;
    validate_adf_threshold(config)?;
    validate_percent_stake(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    validate_initial_capital(config)?;
    validate_commission(config)?;
    validate_risk_free_rate(config)?;
    validate_timeframe(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> MeanrevError {
    MeanrevError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Reads a numeric key, rejecting values that are present but not numbers.
fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, MeanrevError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(section, key, format!("{} must be a number, got '{}'", key, raw))),
    }
}

fn read_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, MeanrevError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(section, key, format!("{} must be an integer, got '{}'", key, raw))),
    }
}

fn validate_positive_int(
    config: &dyn ConfigPort,
    key: &str,
    default: i64,
) -> Result<i64, MeanrevError> {
    let value = read_int(config, "strategy", key, default)?;
    if value <= 0 {
        return Err(invalid("strategy", key, format!("{} must be positive", key)));
    }
    Ok(value)
}

fn validate_fast_period(config: &dyn ConfigPort, period: i64) -> Result<(), MeanrevError> {
    let value = validate_positive_int(config, "fast_period", (period / 2).max(1))?;
    if value >= period {
        return Err(invalid(
            "strategy",
            "fast_period",
            "fast_period must be shorter than period",
        ));
    }
    Ok(())
}

fn validate_devfactor(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    let value = read_double(config, "strategy", "devfactor", 2.0)?;
    if !(value > 0.0 && value.is_finite()) {
        return Err(invalid("strategy", "devfactor", "devfactor must be positive"));
    }
    Ok(())
}

fn validate_adf_threshold(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    let value = read_double(config, "strategy", "adf_threshold", 0.5)?;
    if !(value > 0.0 && value <= 1.0) {
        return Err(invalid(
            "strategy",
            "adf_threshold",
            "adf_threshold must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_percent_stake(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    let value = read_double(config, "strategy", "percent_stake", 90.0)?;
    if !(value > 0.0 && value <= 100.0) {
        return Err(invalid(
            "strategy",
            "percent_stake",
            "percent_stake must be in (0, 100]",
        ));
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    let value = read_double(config, "backtest", "initial_capital", 10_000.0)?;
    if !(value > 0.0 && value.is_finite()) {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    let value = read_double(config, "backtest", "commission_pct", 0.0)?;
    if !(value >= 0.0 && value.is_finite()) {
        return Err(invalid(
            "backtest",
            "commission_pct",
            "commission_pct must be non-negative",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    let value = read_double(config, "backtest", "risk_free_rate", 0.04)?;
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_timeframe(config: &dyn ConfigPort) -> Result<(), MeanrevError> {
    if let Some(raw) = config.get_string("backtest", "timeframe") {
        raw.parse::<Timeframe>()
            .map_err(|reason| invalid("backtest", "timeframe", reason))?;
    }
    Ok(())
}
