//! Run settings built from a validated configuration.

use std::path::PathBuf;

use crate::domain::bar::PriceField;
use crate::domain::config_validation::{alma_source, rsi_smoothing, session_time, validate_config};
use crate::domain::error::BarquantError;
use crate::domain::indicator::{AlmaParams, AlmaSource, IndicatorType, RsiSmoothing};
use crate::domain::session::SessionWindow;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub path: PathBuf,
    pub symbol: Option<String>,
    pub timestamp_format: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub regular_hours_only: bool,
    pub window: SessionWindow,
    pub opening_range_bars: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSettings {
    pub rsi_interval: usize,
    pub rsi_smoothing: RsiSmoothing,
    pub alma_source: PriceField,
    pub alma: AlmaParams,
}

impl IndicatorSettings {
    /// `rsi` followed by `<source>_alma`.
    pub fn indicator_types(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::Rsi {
                interval: self.rsi_interval,
                smoothing: self.rsi_smoothing,
            },
            IndicatorType::alma(AlmaSource::Price(self.alma_source), &self.alma),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub indicators: PathBuf,
    pub trade_log: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data: DataSettings,
    pub session: SessionSettings,
    pub indicators: IndicatorSettings,
    pub output: OutputSettings,
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BarquantError> {
        validate_config(config)?;

        let data = DataSettings {
            path: PathBuf::from(
                config
                    .get_trimmed("data", "path")
                    .unwrap_or_else(|| ".".to_string()),
            ),
            symbol: config.get_trimmed("data", "symbol"),
            timestamp_format: config
                .get_trimmed("data", "timestamp_format")
                .unwrap_or_else(|| DEFAULT_TIMESTAMP_FORMAT.to_string()),
        };

        let session = SessionSettings {
            regular_hours_only: config.get_bool("session", "regular_hours_only", true),
            window: SessionWindow::new(
                session_time(config, "start", "09:30")?,
                session_time(config, "end", "15:55")?,
            )?,
            opening_range_bars: config.get_int("session", "opening_range_bars", 3) as usize,
        };

        let indicators = IndicatorSettings {
            rsi_interval: config.get_int("indicators", "rsi_interval", 14) as usize,
            rsi_smoothing: rsi_smoothing(config)?,
            alma_source: alma_source(config)?,
            alma: AlmaParams::new(
                config.get_int("indicators", "alma_window", 20) as usize,
                config.get_double("indicators", "alma_offset", 0.85),
                config.get_double("indicators", "alma_sigma", 6.0),
            )?,
        };

        let output = OutputSettings {
            indicators: PathBuf::from(
                config
                    .get_trimmed("output", "indicators")
                    .unwrap_or_else(|| "indicators.csv".to_string()),
            ),
            trade_log: PathBuf::from(
                config
                    .get_trimmed("output", "trade_log")
                    .unwrap_or_else(|| "trades.txt".to_string()),
            ),
        };

        Ok(Self {
            data,
            session,
            indicators,
            output,
        })
    }
}
