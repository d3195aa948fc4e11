//! Report output port trait.

use std::path::Path;

use crate::domain::bar_series::BarSeries;
use crate::domain::error::BarquantError;
use crate::domain::indicator::IndicatorColumn;
use crate::domain::ledger::Ledger;

/// Port for writing derived columns and trade logs.
pub trait ReportPort {
    /// The series with one extra column per indicator, aligned by index.
    fn write_indicators(
        &self,
        series: &BarSeries,
        columns: &[IndicatorColumn],
        output_path: &Path,
    ) -> Result<(), BarquantError>;

    /// One line per closed trade.
    fn write_trade_log(&self, ledger: &Ledger, output_path: &Path) -> Result<(), BarquantError>;
}
