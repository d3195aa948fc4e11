//! Arnaud-Legoux Moving Average.
//!
//! Gaussian-weighted average over the last `window` values:
//! w[k] = exp(-(k - m)^2 / (2 s^2)), m = floor(offset * (window - 1)),
//! s = window / sigma, ALMA = sum(w[k] * v[k]) / sum(w[k]).
//!
//! Each output is recomputed over its full window; only the weight vector is
//! shared between indices. Warmup: first (window - 1) values are undefined.

use crate::domain::bar::PriceField;
use crate::domain::bar_series::BarSeries;
use crate::domain::error::BarquantError;
use crate::domain::indicator::{AlmaSource, IndicatorColumn, IndicatorPoint, IndicatorType};

pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_OFFSET: f64 = 0.85;
pub const DEFAULT_SIGMA: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlmaParams {
    window: usize,
    offset: f64,
    sigma: f64,
}

impl AlmaParams {
    pub fn new(window: usize, offset: f64, sigma: f64) -> Result<Self, BarquantError> {
        if window == 0 {
            return Err(BarquantError::invalid_parameter(
                "alma window",
                "must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&offset) {
            return Err(BarquantError::invalid_parameter(
                "alma offset",
                format!("{offset} is outside [0, 1]"),
            ));
        }
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(BarquantError::invalid_parameter(
                "alma sigma",
                format!("{sigma} must be positive"),
            ));
        }
        Ok(Self {
            window,
            offset,
            sigma,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Default for AlmaParams {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            offset: DEFAULT_OFFSET,
            sigma: DEFAULT_SIGMA,
        }
    }
}

/// Precomputed Gaussian taps for one parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct AlmaWeights {
    weights: Vec<f64>,
    total: f64,
}

impl AlmaWeights {
    pub fn new(params: &AlmaParams) -> Self {
        let window = params.window;
        let m = (params.offset * (window - 1) as f64).floor();
        let s = window as f64 / params.sigma;
        let weights: Vec<f64> = (0..window)
            .map(|k| {
                let d = k as f64 - m;
                (-(d * d) / (2.0 * s * s)).exp()
            })
            .collect();
        let total = weights.iter().sum();
        Self { weights, total }
    }

    pub fn window(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// Weighted average of exactly `window` values, oldest first.
    pub fn apply(&self, values: &[f64]) -> f64 {
        debug_assert_eq!(values.len(), self.weights.len());
        let weighted: f64 = self.weights.iter().zip(values).map(|(w, v)| w * v).sum();
        weighted / self.total
    }
}

pub fn calculate_alma(series: &BarSeries, source: PriceField, params: &AlmaParams) -> IndicatorColumn {
    let weights = AlmaWeights::new(params);
    let inputs: Vec<f64> = series.values(source);
    let window = weights.window();

    let values = series
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i + 1 < window {
                IndicatorPoint::undefined(bar.timestamp)
            } else {
                IndicatorPoint::defined(bar.timestamp, weights.apply(&inputs[i + 1 - window..=i]))
            }
        })
        .collect();

    IndicatorColumn {
        indicator_type: IndicatorType::alma(AlmaSource::Price(source), params),
        values,
    }
}

/// ALMA over another indicator column. A window that still contains an
/// undefined entry stays undefined.
pub fn calculate_alma_of_column(input: &IndicatorColumn, params: &AlmaParams) -> IndicatorColumn {
    let weights = AlmaWeights::new(params);
    let window = weights.window();
    let mut buffer = Vec::with_capacity(window);

    let values = input
        .values
        .iter()
        .enumerate()
        .map(|(i, point)| {
            if i + 1 < window {
                return IndicatorPoint::undefined(point.timestamp);
            }
            buffer.clear();
            for p in &input.values[i + 1 - window..=i] {
                match p.value {
                    Some(v) => buffer.push(v),
                    None => return IndicatorPoint::undefined(point.timestamp),
                }
            }
            IndicatorPoint::defined(point.timestamp, weights.apply(&buffer))
        })
        .collect();

    IndicatorColumn {
        indicator_type: IndicatorType::alma(AlmaSource::Column(input.name()), params),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;
    use crate::domain::indicator::rsi::calculate_rsi;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn make_series(closes: &[f64]) -> BarSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + chrono::Duration::minutes(5 * i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: None,
            })
            .collect();
        BarSeries::new(bars).unwrap()
    }

    #[test]
    fn params_validation() {
        assert!(AlmaParams::new(0, 0.85, 6.0).is_err());
        assert!(AlmaParams::new(20, 1.5, 6.0).is_err());
        assert!(AlmaParams::new(20, -0.1, 6.0).is_err());
        assert!(AlmaParams::new(20, 0.85, 0.0).is_err());
        assert!(AlmaParams::new(20, 0.85, f64::NAN).is_err());
        assert!(AlmaParams::new(1, 0.0, 1.0).is_ok());
    }

    #[test]
    fn default_params() {
        let p = AlmaParams::default();
        assert_eq!(p.window(), 20);
        assert_eq!(p.offset(), 0.85);
        assert_eq!(p.sigma(), 6.0);
    }

    #[test]
    fn weights_peak_at_offset() {
        let weights = AlmaWeights::new(&AlmaParams::default());
        // m = floor(0.85 * 19) = 16
        let peak = weights
            .weights()
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(peak, 16);
        assert_eq!(weights.weights()[16], 1.0);
        assert_relative_eq!(weights.total(), 7.1359554744088, epsilon = 1e-9);
    }

    #[test]
    fn alma_three_tap_known_value() {
        // m = floor(1.7) = 1, s = 0.5 -> taps [e^-2, 1, e^-2]
        let params = AlmaParams::new(3, 0.85, 6.0).unwrap();
        let column = calculate_alma(&make_series(&[1.0, 2.0, 4.0]), PriceField::Close, &params);
        assert_eq!(column.value_at(0), None);
        assert_eq!(column.value_at(1), None);
        assert_relative_eq!(column.value_at(2).unwrap(), 2.1065069789192004, epsilon = 1e-12);
    }

    #[test]
    fn alma_default_on_linear_ramp() {
        let closes: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let column = calculate_alma(&make_series(&closes), PriceField::Close, &AlmaParams::default());
        assert_relative_eq!(column.value_at(19).unwrap(), 16.103149994524856, epsilon = 1e-9);
    }

    #[test]
    fn alma_warmup() {
        let closes: Vec<f64> = (0..25).map(|i| 50.0 + i as f64).collect();
        let column = calculate_alma(&make_series(&closes), PriceField::Close, &AlmaParams::default());
        assert_eq!(column.len(), 25);
        for i in 0..19 {
            assert!(!column.values[i].is_defined(), "bar {i} should be undefined");
        }
        for i in 19..25 {
            assert!(column.values[i].is_defined(), "bar {i} should be defined");
        }
    }

    #[test]
    fn alma_window_one_is_identity() {
        let params = AlmaParams::new(1, 0.85, 6.0).unwrap();
        let column = calculate_alma(&make_series(&[3.0, 7.0, 5.0]), PriceField::Close, &params);
        assert_eq!(column.defined_values(), vec![3.0, 7.0, 5.0]);
    }

    #[test]
    fn alma_constant_input() {
        let column = calculate_alma(&make_series(&[100.0; 30]), PriceField::Close, &AlmaParams::default());
        for v in column.defined_values() {
            assert_relative_eq!(v, 100.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn alma_short_series_all_undefined() {
        let column = calculate_alma(&make_series(&[1.0, 2.0]), PriceField::Close, &AlmaParams::default());
        assert_eq!(column.len(), 2);
        assert!(column.first_defined_index().is_none());
    }

    #[test]
    fn alma_uses_selected_source() {
        let params = AlmaParams::new(1, 0.5, 6.0).unwrap();
        let column = calculate_alma(&make_series(&[10.0, 20.0]), PriceField::High, &params);
        assert_eq!(column.defined_values(), vec![11.0, 21.0]);
        assert_eq!(column.name(), "high_alma");
    }

    #[test]
    fn alma_of_column_waits_for_defined_window() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + ((i * 3) % 7) as f64).collect();
        let rsi = calculate_rsi(&make_series(&closes), 14).unwrap();
        let params = AlmaParams::new(4, 0.85, 6.0).unwrap();
        let smoothed = calculate_alma_of_column(&rsi, &params);

        assert_eq!(smoothed.name(), "rsi_alma");
        assert_eq!(smoothed.len(), rsi.len());
        assert_eq!(smoothed.first_defined_index(), Some(17));
    }

    proptest! {
        #[test]
        fn alma_within_window_range(closes in prop::collection::vec(1.0f64..500.0, 1..60), window in 1usize..20) {
            let params = AlmaParams::new(window, 0.85, 6.0).unwrap();
            let weights = AlmaWeights::new(&params);
            prop_assert!(weights.total() > 0.0);

            let column = calculate_alma(&make_series(&closes), PriceField::Close, &params);
            for (i, point) in column.values.iter().enumerate() {
                prop_assert_eq!(point.is_defined(), i + 1 >= window);
                if let Some(v) = point.value {
                    let slice = &closes[i + 1 - window..=i];
                    let lo = slice.iter().cloned().fold(f64::INFINITY, f64::min);
                    let hi = slice.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9, "{} outside [{}, {}]", v, lo, hi);
                }
            }
        }

        #[test]
        fn alma_is_causal(closes in prop::collection::vec(1.0f64..500.0, 25..60), j in 0usize..25, bump in 1.0f64..100.0) {
            let params = AlmaParams::default();
            let base = calculate_alma(&make_series(&closes), PriceField::Close, &params);
            let mut changed = closes.clone();
            changed[j] += bump;
            let other = calculate_alma(&make_series(&changed), PriceField::Close, &params);
            prop_assert_eq!(&base.values[..j], &other.values[..j]);
        }
    }
}
