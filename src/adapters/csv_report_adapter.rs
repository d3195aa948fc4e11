//! CSV indicator table and plain-text trade log writer.

use std::fs;
use std::path::Path;
use tracing::info;

use crate::domain::bar_series::BarSeries;
use crate::domain::error::BarquantError;
use crate::domain::indicator::IndicatorColumn;
use crate::domain::ledger::Ledger;
use crate::domain::settings::DEFAULT_TIMESTAMP_FORMAT;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter {
    timestamp_format: String,
}

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }

    pub fn with_timestamp_format(mut self, format: &str) -> Self {
        self.timestamp_format = format.to_string();
        self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_error(path: &Path, e: impl std::fmt::Display) -> BarquantError {
    BarquantError::data(format!("failed to write {}: {}", path.display(), e))
}

impl ReportPort for CsvReportAdapter {
    fn write_indicators(
        &self,
        series: &BarSeries,
        columns: &[IndicatorColumn],
        output_path: &Path,
    ) -> Result<(), BarquantError> {
        if let Some(column) = columns.iter().find(|c| c.len() != series.len()) {
            return Err(BarquantError::invalid_parameter(
                "indicator column",
                format!(
                    "{} has {} values for {} bars",
                    column.name(),
                    column.len(),
                    series.len()
                ),
            ));
        }

        let mut wtr = csv::Writer::from_path(output_path).map_err(|e| write_error(output_path, e))?;

        let mut header: Vec<String> = ["timestamp", "open", "high", "low", "close", "volume"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        header.extend(columns.iter().map(IndicatorColumn::name));
        wtr.write_record(&header)
            .map_err(|e| write_error(output_path, e))?;

        for (i, bar) in series.iter().enumerate() {
            let mut row = vec![
                bar.timestamp.format(&self.timestamp_format).to_string(),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.volume.map(|v| v.to_string()).unwrap_or_default(),
            ];
            // undefined values stay as empty cells
            row.extend(
                columns
                    .iter()
                    .map(|c| c.value_at(i).map(|v| v.to_string()).unwrap_or_default()),
            );
            wtr.write_record(&row)
                .map_err(|e| write_error(output_path, e))?;
        }
        wtr.flush()?;

        info!(
            path = %output_path.display(),
            rows = series.len(),
            columns = columns.len(),
            "wrote indicator table"
        );
        Ok(())
    }

    fn write_trade_log(&self, ledger: &Ledger, output_path: &Path) -> Result<(), BarquantError> {
        fs::write(output_path, ledger.log_text()).map_err(|e| write_error(output_path, e))?;
        info!(
            path = %output_path.display(),
            trades = ledger.trades().len(),
            "wrote trade log"
        );
        Ok(())
    }
}
