//! Configuration validation.
//!
//! Validates every config field before any data is loaded.

use chrono::NaiveTime;

use crate::domain::bar::PriceField;
use crate::domain::error::BarquantError;
use crate::domain::indicator::RsiSmoothing;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), BarquantError> {
    validate_data(config)?;
    validate_session(config)?;
    validate_indicators(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> BarquantError {
    BarquantError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Present values must parse; only an absent key takes the default.
fn int_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, BarquantError> {
    match config.get_trimmed(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| invalid(section, key, format!("'{raw}' is not an integer"))),
    }
}

fn double_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, BarquantError> {
    match config.get_trimmed(section, key) {
        None => Ok(default),
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(invalid(section, key, format!("'{raw}' is not a number"))),
        },
    }
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), BarquantError> {
    if let Some(format) = config.get_string("data", "timestamp_format") {
        if !format.contains('%') {
            return Err(invalid(
                "data",
                "timestamp_format",
                "timestamp_format must be a strftime pattern",
            ));
        }
    }
    Ok(())
}

fn validate_session(config: &dyn ConfigPort) -> Result<(), BarquantError> {
    let start = session_time(config, "start", "09:30")?;
    let end = session_time(config, "end", "15:55")?;
    if start >= end {
        return Err(invalid("session", "start", "start must be before end"));
    }

    let bars = int_value(config, "session", "opening_range_bars", 3)?;
    if bars < 1 {
        return Err(invalid(
            "session",
            "opening_range_bars",
            "opening_range_bars must be at least 1",
        ));
    }
    Ok(())
}

fn validate_indicators(config: &dyn ConfigPort) -> Result<(), BarquantError> {
    let interval = int_value(config, "indicators", "rsi_interval", 14)?;
    if interval < 1 {
        return Err(invalid(
            "indicators",
            "rsi_interval",
            "rsi_interval must be at least 1",
        ));
    }
    rsi_smoothing(config)?;
    alma_source(config)?;

    let window = int_value(config, "indicators", "alma_window", 20)?;
    if window < 1 {
        return Err(invalid(
            "indicators",
            "alma_window",
            "alma_window must be at least 1",
        ));
    }
    let offset = double_value(config, "indicators", "alma_offset", 0.85)?;
    if !(0.0..=1.0).contains(&offset) {
        return Err(invalid(
            "indicators",
            "alma_offset",
            "alma_offset must be between 0 and 1",
        ));
    }
    let sigma = double_value(config, "indicators", "alma_sigma", 6.0)?;
    if sigma <= 0.0 {
        return Err(invalid(
            "indicators",
            "alma_sigma",
            "alma_sigma must be positive",
        ));
    }
    Ok(())
}

/// `[session] <key>` as HH:MM or HH:MM:SS, or `default` when absent.
pub fn session_time(
    config: &dyn ConfigPort,
    key: &str,
    default: &str,
) -> Result<NaiveTime, BarquantError> {
    let raw = config
        .get_trimmed("session", key)
        .unwrap_or_else(|| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
        .map_err(|_| invalid("session", key, format!("invalid time '{raw}', expected HH:MM")))
}

pub fn rsi_smoothing(config: &dyn ConfigPort) -> Result<RsiSmoothing, BarquantError> {
    match config.get_trimmed("indicators", "rsi_smoothing") {
        None => Ok(RsiSmoothing::default()),
        Some(s) => s
            .parse()
            .map_err(|e: BarquantError| invalid("indicators", "rsi_smoothing", e.to_string())),
    }
}

pub fn alma_source(config: &dyn ConfigPort) -> Result<PriceField, BarquantError> {
    match config.get_trimmed("indicators", "alma_source") {
        None => Ok(PriceField::default()),
        Some(s) => s
            .parse()
            .map_err(|e: BarquantError| invalid("indicators", "alma_source", e.to_string())),
    }
}
