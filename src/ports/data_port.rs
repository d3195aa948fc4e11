//! Data access port trait.

use chrono::NaiveDateTime;

use crate::domain::bar_series::BarSeries;
use crate::domain::error::BarquantError;

pub trait DataPort {
    /// Full chronological series for `symbol`.
    fn fetch_bars(&self, symbol: &str) -> Result<BarSeries, BarquantError>;

    fn list_symbols(&self) -> Result<Vec<String>, BarquantError>;

    /// First timestamp, last timestamp and bar count, or `None` when the
    /// symbol has no bars.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, BarquantError> {
        let series = self.fetch_bars(symbol)?;
        Ok(series
            .date_range()
            .map(|(first, last)| (first, last, series.len())))
    }
}
