//! RSI (Relative Strength Index).
//!
//! delta[i] = C[i] - C[i-1], split into gain = max(delta, 0) and
//! loss = max(-delta, 0), each smoothed independently, then
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//!
//! Two smoothing conventions:
//! - `Ewm` (default): adjusted exponentially weighted mean with
//!   alpha = 1/n (centre of mass n-1), averaged over every delta seen so far.
//!   This is the TradingView-style charting convention.
//! - `Wilder`: simple mean of the first n deltas, then
//!   avg = (prev_avg * (n-1) + current) / n.
//!
//! avg_loss == 0 with avg_gain > 0 gives 100. A window without any movement
//! (both averages zero) gives `NEUTRAL_RSI`.
//!
//! Warmup: first n bars are undefined (n deltas are needed).

use crate::domain::bar_series::BarSeries;
use crate::domain::error::BarquantError;
use crate::domain::indicator::{IndicatorColumn, IndicatorPoint, IndicatorType};

pub const DEFAULT_INTERVAL: usize = 14;

/// RSI reported when average gain and average loss are both zero.
pub const NEUTRAL_RSI: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RsiSmoothing {
    #[default]
    Ewm,
    Wilder,
}

impl std::str::FromStr for RsiSmoothing {
    type Err = BarquantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ewm" => Ok(RsiSmoothing::Ewm),
            "wilder" => Ok(RsiSmoothing::Wilder),
            other => Err(BarquantError::invalid_parameter(
                "rsi smoothing",
                format!("unknown smoothing '{other}' (expected ewm or wilder)"),
            )),
        }
    }
}

pub fn calculate_rsi(series: &BarSeries, interval: usize) -> Result<IndicatorColumn, BarquantError> {
    calculate_rsi_with(series, interval, RsiSmoothing::default())
}

pub fn calculate_rsi_with(
    series: &BarSeries,
    interval: usize,
    smoothing: RsiSmoothing,
) -> Result<IndicatorColumn, BarquantError> {
    if interval == 0 {
        return Err(BarquantError::invalid_parameter(
            "rsi interval",
            "must be at least 1",
        ));
    }

    let bars = series.bars();
    let mut values = Vec::with_capacity(bars.len());
    let mut gain = Smoother::new(interval, smoothing);
    let mut loss = Smoother::new(interval, smoothing);

    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            values.push(IndicatorPoint::undefined(bar.timestamp));
            continue;
        }

        let change = bar.close - bars[i - 1].close;
        let avg_gain = gain.update(change.max(0.0));
        let avg_loss = loss.update((-change).max(0.0));

        let point = match (avg_gain, avg_loss) {
            (Some(g), Some(l)) => IndicatorPoint::defined(bar.timestamp, rsi_from_averages(g, l)),
            _ => IndicatorPoint::undefined(bar.timestamp),
        };
        values.push(point);
    }

    Ok(IndicatorColumn {
        indicator_type: IndicatorType::Rsi {
            interval,
            smoothing,
        },
        values,
    })
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { NEUTRAL_RSI } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

/// Running average of one side (gains or losses). Returns `None` until
/// `interval` observations have been seen.
struct Smoother {
    interval: usize,
    smoothing: RsiSmoothing,
    count: usize,
    // Ewm: weighted sum and weight total. Wilder: running sum, then the average.
    numerator: f64,
    denominator: f64,
}

impl Smoother {
    fn new(interval: usize, smoothing: RsiSmoothing) -> Self {
        Self {
            interval,
            smoothing,
            count: 0,
            numerator: 0.0,
            denominator: 0.0,
        }
    }

    fn update(&mut self, x: f64) -> Option<f64> {
        self.count += 1;
        let n = self.interval as f64;

        match self.smoothing {
            RsiSmoothing::Ewm => {
                let decay = 1.0 - 1.0 / n;
                self.numerator = x + decay * self.numerator;
                self.denominator = 1.0 + decay * self.denominator;
                (self.count >= self.interval).then(|| self.numerator / self.denominator)
            }
            RsiSmoothing::Wilder => {
                if self.count < self.interval {
                    self.numerator += x;
                    None
                } else if self.count == self.interval {
                    self.numerator = (self.numerator + x) / n;
                    Some(self.numerator)
                } else {
                    self.numerator = (self.numerator * (n - 1.0) + x) / n;
                    Some(self.numerator)
                }
            }
        }
    }
}
