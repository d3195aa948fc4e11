#![allow(dead_code)]

use barquant::domain::bar::Bar;
use barquant::domain::bar_series::BarSeries;
use barquant::domain::error::BarquantError;
use barquant::ports::data_port::DataPort;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<BarSeries, BarquantError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(BarquantError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) => BarSeries::from_unsorted(bars.clone()),
            None => Err(BarquantError::NoData {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn list_symbols(&self) -> Result<Vec<String>, BarquantError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// Bar closing at `close`, with a one-point range around it.
pub fn make_bar(timestamp: NaiveDateTime, close: f64) -> Bar {
    Bar {
        timestamp,
        open: close - 0.25,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume: Some(1000),
    }
}

/// Five-minute bars from `start`, one per close.
pub fn bars_from_closes(start: NaiveDateTime, closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(start + Duration::minutes(5 * i as i64), close))
        .collect()
}

pub fn series_from_closes(closes: &[f64]) -> BarSeries {
    BarSeries::new(bars_from_closes(ts("2024-01-16 09:30:00"), closes)).unwrap()
}

/// Deterministic up-and-down walk around `start_price`.
pub fn zigzag_closes(count: usize, start_price: f64) -> Vec<f64> {
    let steps = [0.8, -0.3, 1.1, -1.6, 0.4, 0.9, -0.7, -0.2, 1.3, -0.9];
    let mut price = start_price;
    (0..count)
        .map(|i| {
            if i > 0 {
                price += steps[i % steps.len()];
            }
            price
        })
        .collect()
}

/// Two regular sessions of 5-minute bars, each with a pre-market bar at 09:00
/// and an after-hours bar at 16:30.
pub fn two_session_bars() -> Vec<Bar> {
    let mut bars = Vec::new();
    for (day, base) in [("2024-01-16", 470.0), ("2024-01-17", 472.0)] {
        bars.push(make_bar(ts(&format!("{day} 09:00:00")), base - 1.0));
        let closes = zigzag_closes(12, base);
        bars.extend(bars_from_closes(ts(&format!("{day} 09:30:00")), &closes));
        bars.push(make_bar(ts(&format!("{day} 16:30:00")), base + 1.0));
    }
    bars
}

pub fn write_bars_csv(path: &Path, bars: &[Bar]) {
    let mut content = String::from("timestamp,open,high,low,close,volume\n");
    for bar in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.timestamp.format("%Y-%m-%d %H:%M:%S"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume.map(|v| v.to_string()).unwrap_or_default()
        ));
    }
    fs::write(path, content).unwrap();
}
