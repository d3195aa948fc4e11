//! Technical indicator implementations.
//!
//! This module provides types for representing indicator output:
//! - `IndicatorPoint`: one entry of a column, `None` until the warm-up is over
//! - `IndicatorType`: indicator identity + parameters (serves as HashMap key)
//! - `IndicatorColumn`: a column aligned 1:1 with the input `BarSeries`
//!
//! Every column is causal: the value at index `i` depends only on bars `0..=i`.

pub mod alma;
pub mod rsi;

use chrono::NaiveDateTime;
use std::fmt;

use crate::domain::bar::PriceField;
use crate::domain::bar_series::BarSeries;
use crate::domain::error::BarquantError;

pub use alma::{AlmaParams, AlmaWeights};
pub use rsi::RsiSmoothing;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
}

impl IndicatorPoint {
    pub fn undefined(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            value: None,
        }
    }

    pub fn defined(timestamp: NaiveDateTime, value: f64) -> Self {
        Self {
            timestamp,
            value: Some(value),
        }
    }

    pub fn is_defined(&self) -> bool {
        self.value.is_some()
    }
}

/// Input an ALMA is smoothed over.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AlmaSource {
    Price(PriceField),
    /// Another indicator column, looked up by its column name.
    Column(String),
}

impl AlmaSource {
    pub fn name(&self) -> &str {
        match self {
            AlmaSource::Price(field) => field.name(),
            AlmaSource::Column(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Rsi {
        interval: usize,
        smoothing: RsiSmoothing,
    },
    Alma {
        source: AlmaSource,
        window: usize,
        /// `f64::to_bits` of the offset, so the exact value survives and the type stays hashable.
        offset_bits: u64,
        sigma_bits: u64,
    },
}

impl IndicatorType {
    pub fn rsi(interval: usize) -> Self {
        IndicatorType::Rsi {
            interval,
            smoothing: RsiSmoothing::default(),
        }
    }

    pub fn alma(source: AlmaSource, params: &AlmaParams) -> Self {
        IndicatorType::Alma {
            source,
            window: params.window(),
            offset_bits: params.offset().to_bits(),
            sigma_bits: params.sigma().to_bits(),
        }
    }

    /// Name of the derived column, e.g. `rsi` or `close_alma`.
    pub fn column_name(&self) -> String {
        match self {
            IndicatorType::Rsi { .. } => "rsi".to_string(),
            IndicatorType::Alma { source, .. } => format!("{}_alma", source.name()),
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Rsi {
                interval,
                smoothing: RsiSmoothing::Ewm,
            } => write!(f, "RSI({})", interval),
            IndicatorType::Rsi {
                interval,
                smoothing: RsiSmoothing::Wilder,
            } => write!(f, "RSI({},wilder)", interval),
            IndicatorType::Alma {
                source,
                window,
                offset_bits,
                sigma_bits,
            } => {
                let offset = f64::from_bits(*offset_bits);
                let sigma = f64::from_bits(*sigma_bits);
                write!(f, "ALMA({},{},{},{})", source.name(), window, offset, sigma)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorColumn {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorColumn {
    pub fn name(&self) -> String {
        self.indicator_type.column_name()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(|p| p.value)
    }

    pub fn first_defined_index(&self) -> Option<usize> {
        self.values.iter().position(IndicatorPoint::is_defined)
    }

    pub fn defined_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(|p| p.value).collect()
    }
}

/// Computes `types` in order. An ALMA over a `Column` source must be listed
/// after the column it reads.
pub fn compute_indicators(
    series: &BarSeries,
    types: &[IndicatorType],
) -> Result<Vec<IndicatorColumn>, BarquantError> {
    let mut columns: Vec<IndicatorColumn> = Vec::with_capacity(types.len());

    for indicator_type in types {
        let column = match indicator_type {
            IndicatorType::Rsi {
                interval,
                smoothing,
            } => rsi::calculate_rsi_with(series, *interval, *smoothing)?,
            IndicatorType::Alma {
                source,
                window,
                offset_bits,
                sigma_bits,
            } => {
                let params = AlmaParams::new(
                    *window,
                    f64::from_bits(*offset_bits),
                    f64::from_bits(*sigma_bits),
                )?;
                match source {
                    AlmaSource::Price(field) => alma::calculate_alma(series, *field, &params),
                    AlmaSource::Column(name) => {
                        let input = columns
                            .iter()
                            .find(|c| &c.name() == name)
                            .ok_or_else(|| {
                                BarquantError::invalid_parameter(
                                    "alma source",
                                    format!("column '{name}' has not been computed"),
                                )
                            })?;
                        alma::calculate_alma_of_column(input, &params)
                    }
                }
            }
        };
        columns.push(column);
    }

    Ok(columns)
}
