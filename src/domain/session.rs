//! Trading-session helpers: regular-hours window and opening range.

use chrono::{NaiveDate, NaiveTime};

use crate::domain::bar_series::BarSeries;
use crate::domain::error::BarquantError;

pub const DEFAULT_OPENING_RANGE_BARS: usize = 3;

/// Time-of-day window a session is restricted to, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SessionWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, BarquantError> {
        if start >= end {
            return Err(BarquantError::invalid_parameter(
                "session window",
                format!("start {start} must be before end {end}"),
            ));
        }
        Ok(Self { start, end })
    }

    /// US equities regular hours, 09:30 up to the last 5-minute bar at 15:55.
    pub fn regular_hours() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(15, 55, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        (self.start..=self.end).contains(&time)
    }

    pub fn apply(&self, series: &BarSeries) -> BarSeries {
        series.between_times(self.start, self.end)
    }
}

impl Default for SessionWindow {
    fn default() -> Self {
        Self::regular_hours()
    }
}

/// High/low band of the first bars of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpeningRange {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
}

impl OpeningRange {
    /// Range over the first `bars` bars of `session`. `None` if the session
    /// is empty or `bars` is zero; a shorter session uses what it has.
    pub fn from_session(session: &BarSeries, bars: usize) -> Option<Self> {
        let first = session.first()?;
        if bars == 0 {
            return None;
        }
        let opening = &session.bars()[..bars.min(session.len())];
        let high = opening.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let low = opening.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        Some(Self {
            date: first.date(),
            high,
            low,
        })
    }

    pub fn mid(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    pub fn half_range(&self) -> f64 {
        (self.high - self.low) / 2.0
    }

    pub fn contains(&self, price: f64) -> bool {
        (self.low..=self.high).contains(&price)
    }
}

/// Opening range of every trading day in `series`.
pub fn opening_ranges(series: &BarSeries, bars: usize) -> Vec<OpeningRange> {
    series
        .trading_days()
        .into_iter()
        .filter_map(|day| OpeningRange::from_session(&series.session(day), bars))
        .collect()
}
