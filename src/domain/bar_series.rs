//! Chronologically ordered bar series.
//!
//! Every constructor enforces strictly ascending timestamps, so indicator code
//! can treat index order as time order.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::bar::{Bar, PriceField};
use crate::domain::error::BarquantError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Wraps bars that must already be in strictly ascending timestamp order.
    pub fn new(bars: Vec<Bar>) -> Result<Self, BarquantError> {
        for (i, pair) in bars.windows(2).enumerate() {
            let (previous, current) = (pair[0].timestamp, pair[1].timestamp);
            if current == previous {
                return Err(BarquantError::DuplicateTimestamp {
                    index: i + 1,
                    timestamp: current,
                });
            }
            if current < previous {
                return Err(BarquantError::UnsortedSeries {
                    index: i + 1,
                    previous,
                    current,
                });
            }
        }
        Ok(Self { bars })
    }

    /// Sorts by timestamp first. Duplicate timestamps are still rejected.
    pub fn from_unsorted(mut bars: Vec<Bar>) -> Result<Self, BarquantError> {
        bars.sort_by_key(|b| b.timestamp);
        Self::new(bars)
    }

    /// Concatenates several series into one chronological series.
    ///
    /// A bar repeated identically across parts is kept once, so overlapping
    /// files merge cleanly. Two different bars sharing a timestamp are still
    /// a `DuplicateTimestamp` error.
    pub fn merge<I>(parts: I) -> Result<Self, BarquantError>
    where
        I: IntoIterator<Item = BarSeries>,
    {
        let mut bars: Vec<Bar> = parts.into_iter().flat_map(|s| s.bars).collect();
        bars.sort_by_key(|b| b.timestamp);
        bars.dedup();
        Self::new(bars)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bar_at(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    /// Bars `0..=index`, the unit sliding-window indicators operate over.
    pub fn prefix(&self, index: usize) -> Option<&[Bar]> {
        if index < self.bars.len() {
            Some(&self.bars[..=index])
        } else {
            None
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }

    pub fn values(&self, field: PriceField) -> Vec<f64> {
        self.bars.iter().map(|b| field.value(b)).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.values(PriceField::Close)
    }

    pub fn index_of(&self, timestamp: NaiveDateTime) -> Option<usize> {
        self.bars
            .binary_search_by_key(&timestamp, |b| b.timestamp)
            .ok()
    }

    pub fn date_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match (self.bars.first(), self.bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }

    /// Distinct calendar dates, ascending.
    pub fn trading_days(&self) -> Vec<NaiveDate> {
        let mut days: Vec<NaiveDate> = self.bars.iter().map(Bar::date).collect();
        days.dedup();
        days
    }

    /// Bars whose time of day lies in `start..=end`.
    pub fn between_times(&self, start: NaiveTime, end: NaiveTime) -> BarSeries {
        let bars = self
            .bars
            .iter()
            .filter(|b| (start..=end).contains(&b.timestamp.time()))
            .cloned()
            .collect();
        BarSeries { bars }
    }

    /// All bars that fall on `date`.
    pub fn session(&self, date: NaiveDate) -> BarSeries {
        let bars = self
            .bars
            .iter()
            .filter(|b| b.date() == date)
            .cloned()
            .collect();
        BarSeries { bars }
    }
}

impl<'a> IntoIterator for &'a BarSeries {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}
