//! CSV file data adapter.
//!
//! Reads `<symbol>.csv` files with a header row naming at least
//! `timestamp,open,high,low,close`; `volume` is optional. Column order is free.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::domain::bar::Bar;
use crate::domain::bar_series::BarSeries;
use crate::domain::error::BarquantError;
use crate::domain::replay::{Signal, SignalAction};
use crate::domain::settings::DEFAULT_TIMESTAMP_FORMAT;
use crate::ports::data_port::DataPort;

pub struct CsvAdapter {
    base_path: PathBuf,
    timestamp_format: String,
}

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord, source: &str) -> Result<Self, BarquantError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                BarquantError::data(format!("{source}: missing {name} column"))
            })
        };
        Ok(Self {
            timestamp: require("timestamp")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }

    pub fn with_timestamp_format(mut self, format: &str) -> Self {
        self.timestamp_format = format.to_string();
        self
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    /// Loads one file and sorts it; duplicate timestamps are an error.
    pub fn load_file(&self, path: &Path) -> Result<BarSeries, BarquantError> {
        let file = fs::File::open(path).map_err(|e| {
            BarquantError::data(format!("failed to read {}: {}", path.display(), e))
        })?;
        let bars = self.read_bars(file, &path.display().to_string())?;
        info!(path = %path.display(), bars = bars.len(), "loaded bars");
        BarSeries::from_unsorted(bars)
    }

    pub fn read_bars<R: Read>(&self, reader: R, source: &str) -> Result<Vec<Bar>, BarquantError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|e| BarquantError::data(format!("{source}: CSV header error: {e}")))?
            .clone();
        let columns = Columns::from_headers(&headers, source)?;

        let mut bars = Vec::new();
        let mut malformed = 0usize;

        for (row, result) in rdr.records().enumerate() {
            let record = result
                .map_err(|e| BarquantError::data(format!("{source}: CSV parse error: {e}")))?;
            // header is line 1
            let line = row + 2;

            let field = |index: usize, name: &str| {
                record.get(index).map(str::trim).ok_or_else(|| {
                    BarquantError::data(format!("{source}:{line}: missing {name} value"))
                })
            };
            let price = |index: usize, name: &str| -> Result<f64, BarquantError> {
                field(index, name)?.parse().map_err(|e| {
                    BarquantError::data(format!("{source}:{line}: invalid {name} value: {e}"))
                })
            };

            let timestamp = parse_timestamp(field(columns.timestamp, "timestamp")?, &self.timestamp_format)
                .map_err(|reason| BarquantError::data(format!("{source}:{line}: {reason}")))?;

            let volume = match columns.volume {
                Some(index) => parse_volume(field(index, "volume")?).map_err(|reason| {
                    BarquantError::data(format!("{source}:{line}: {reason}"))
                })?,
                None => None,
            };

            let bar = Bar {
                timestamp,
                open: price(columns.open, "open")?,
                high: price(columns.high, "high")?,
                low: price(columns.low, "low")?,
                close: price(columns.close, "close")?,
                volume,
            };
            if !bar.is_well_formed() {
                malformed += 1;
                debug!(%source, line, "bar outside its own high/low range");
            }
            bars.push(bar);
        }

        if malformed > 0 {
            warn!(%source, malformed, "bars with inconsistent OHLC values");
        }
        Ok(bars)
    }

    /// Concatenates several files into one series, optionally writing the
    /// merged table to `output`.
    pub fn merge_csvs(
        &self,
        paths: &[PathBuf],
        output: Option<&Path>,
    ) -> Result<BarSeries, BarquantError> {
        let parts = paths
            .iter()
            .map(|p| self.load_file(p))
            .collect::<Result<Vec<_>, _>>()?;
        let merged = BarSeries::merge(parts)?;
        info!(files = paths.len(), bars = merged.len(), "merged bar files");

        if let Some(output) = output {
            self.write_bars(&merged, output)?;
        }
        Ok(merged)
    }

    pub fn write_bars(&self, series: &BarSeries, output: &Path) -> Result<(), BarquantError> {
        let mut wtr = csv::Writer::from_path(output).map_err(|e| {
            BarquantError::data(format!("failed to create {}: {}", output.display(), e))
        })?;
        let write_err =
            |e: csv::Error| BarquantError::data(format!("failed to write {}: {}", output.display(), e));

        wtr.write_record(["timestamp", "open", "high", "low", "close", "volume"])
            .map_err(write_err)?;
        for bar in series {
            wtr.write_record([
                bar.timestamp.format(&self.timestamp_format).to_string(),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.volume.map(|v| v.to_string()).unwrap_or_default(),
            ])
            .map_err(write_err)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Reads a `timestamp,action` file of externally decided trades.
    pub fn read_signals(&self, path: &Path) -> Result<Vec<Signal>, BarquantError> {
        let content = fs::read_to_string(path).map_err(|e| {
            BarquantError::data(format!("failed to read {}: {}", path.display(), e))
        })?;
        let source = path.display().to_string();
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut signals = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let line = row + 2;
            let record = result
                .map_err(|e| BarquantError::data(format!("{source}: CSV parse error: {e}")))?;
            let ts_str = record.get(0).ok_or_else(|| {
                BarquantError::data(format!("{source}:{line}: missing timestamp"))
            })?;
            let action_str = record.get(1).ok_or_else(|| {
                BarquantError::data(format!("{source}:{line}: missing action"))
            })?;

            let timestamp = parse_timestamp(ts_str.trim(), &self.timestamp_format)
                .map_err(|reason| BarquantError::data(format!("{source}:{line}: {reason}")))?;
            let action: SignalAction = action_str.parse()?;
            signals.push(Signal { timestamp, action });
        }

        debug!(%source, signals = signals.len(), "loaded signals");
        Ok(signals)
    }
}

/// Parses with `format`; date-only formats resolve to midnight.
pub fn parse_timestamp(value: &str, format: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, format)
        .or_else(|_| NaiveDate::parse_from_str(value, format).map(|d| d.and_time(NaiveTime::MIN)))
        .map_err(|e| format!("invalid timestamp '{value}' for format '{format}': {e}"))
}

fn parse_volume(value: &str) -> Result<Option<i64>, String> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<i64>()
        .or_else(|_| value.parse::<f64>().map(|v| v.round() as i64))
        .map(Some)
        .map_err(|e| format!("invalid volume value: {e}"))
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<BarSeries, BarquantError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Err(BarquantError::NoData {
                symbol: symbol.to_string(),
            });
        }
        self.load_file(&path)
    }

    fn list_symbols(&self) -> Result<Vec<String>, BarquantError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            BarquantError::data(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| BarquantError::data(format!("directory entry error: {}", e)))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
