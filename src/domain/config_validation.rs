//! Configuration validation.
//!
//! Every key is optional. Validation only rejects values that are present
//! but unusable, before any data is loaded.

use std::str::FromStr;

use crate::domain::error::BacktestError;
use crate::ports::config_port::ConfigPort;

pub const REPORT_FILE_KEYS: [&str; 5] = [
    "fixed_file",
    "reinvest_file",
    "nondup_file",
    "quarterly_file",
    "trades_file",
];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_capital(config)?;
    validate_exit(config)?;
    validate_report(config)?;
    validate_run(config)?;
    Ok(())
}

fn validate_capital(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    for key in ["initial_capital", "collateral_ratio"] {
        if let Some(value) = parse_value::<f64>(config, "capital", key)? {
            if value <= 0.0 || !value.is_finite() {
                return Err(invalid("capital", key, format!("{key} must be positive")));
            }
        }
    }
    Ok(())
}

fn validate_exit(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(value) = parse_value::<i64>(config, "exit", "tick_threshold")? {
        if value < 1 {
            return Err(invalid(
                "exit",
                "tick_threshold",
                "tick_threshold must be at least 1".to_string(),
            ));
        }
    }
    if let Some(value) = parse_value::<i64>(config, "exit", "max_wait")? {
        if value < 0 {
            return Err(invalid(
                "exit",
                "max_wait",
                "max_wait must be non-negative".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_report(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    for key in REPORT_FILE_KEYS {
        if let Some(name) = config.get_string("report", key) {
            if name.trim().is_empty() {
                return Err(invalid("report", key, format!("{key} must not be empty")));
            }
        }
    }
    Ok(())
}

fn validate_run(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(raw) = config.get_string("run", "parallel") {
        let value = raw.trim().to_lowercase();
        let known = ["true", "false", "yes", "no", "on", "off", "1", "0"];
        if !known.contains(&value.as_str()) {
            return Err(invalid(
                "run",
                "parallel",
                format!("expected a boolean, got {raw:?}"),
            ));
        }
    }
    Ok(())
}

/// `None` when the key is absent; an error when present but unparseable.
fn parse_value<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, BacktestError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| invalid(section, key, format!("invalid number {raw:?}")))
}

fn invalid(section: &str, key: &str, reason: String) -> BacktestError {
    BacktestError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}
