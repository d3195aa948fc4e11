//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::bar_series::BarSeries;
use crate::domain::error::BarquantError;
use crate::domain::indicator::{compute_indicators, IndicatorColumn};
use crate::domain::ledger::{Ledger, LedgerStatistics};
use crate::domain::levels::TradeLevels;
use crate::domain::position::Direction;
use crate::domain::replay::{replay_signals, Signal};
use crate::domain::session::OpeningRange;
use crate::domain::settings::{Settings, DEFAULT_TIMESTAMP_FORMAT};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "barquant", about = "Intraday bar indicators and trade ledger")]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute RSI and ALMA columns and write the indicator table
    Indicators {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay a signals file through the ledger and write the trade log
    Trades {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        signals: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show data range, trading days and the last opening range
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Print stop-loss, take-profit and risk/reward for a planned trade
    Levels {
        #[arg(long)]
        direction: String,
        #[arg(long)]
        entry: f64,
        #[arg(long, allow_negative_numbers = true)]
        low: f64,
        #[arg(long, allow_negative_numbers = true)]
        high: f64,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Merge bar CSV files into one sorted file
    Merge {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value = DEFAULT_TIMESTAMP_FORMAT)]
        timestamp_format: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Indicators {
            config,
            symbol,
            output,
        } => run_indicators(&config, symbol.as_deref(), output.as_deref()),
        Command::Trades {
            config,
            signals,
            symbol,
            output,
        } => run_trades(&config, &signals, symbol.as_deref(), output.as_deref()),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
        Command::Levels {
            direction,
            entry,
            low,
            high,
        } => run_levels(&direction, entry, low, high),
        Command::Validate { config } => run_validate(&config),
        Command::Merge {
            output,
            timestamp_format,
            files,
        } => run_merge(&files, &output, &timestamp_format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, BarquantError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

pub fn load_settings(path: &Path) -> Result<Settings, BarquantError> {
    let adapter = load_config(path)?;
    Settings::from_config(&adapter)
}

/// `--symbol` wins over `[data] symbol`; both are upper-cased.
pub fn resolve_symbol(
    symbol_override: Option<&str>,
    settings: &Settings,
) -> Result<String, BarquantError> {
    symbol_override
        .map(str::to_string)
        .or_else(|| settings.data.symbol.clone())
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BarquantError::ConfigMissing {
            section: "data".into(),
            key: "symbol".into(),
        })
}

fn data_adapter(settings: &Settings) -> CsvAdapter {
    CsvAdapter::new(settings.data.path.clone())
        .with_timestamp_format(&settings.data.timestamp_format)
}

fn report_adapter(settings: &Settings) -> CsvReportAdapter {
    CsvReportAdapter::new().with_timestamp_format(&settings.data.timestamp_format)
}

/// Fetches `symbol` and applies the session filter when configured.
pub fn prepare_series(
    data_port: &dyn DataPort,
    settings: &Settings,
    symbol: &str,
) -> Result<BarSeries, BarquantError> {
    let series = data_port.fetch_bars(symbol)?;
    if series.is_empty() {
        return Err(BarquantError::NoData {
            symbol: symbol.to_string(),
        });
    }

    if !settings.session.regular_hours_only {
        return Ok(series);
    }

    let filtered = settings.session.window.apply(&series);
    info!(
        symbol,
        before = series.len(),
        after = filtered.len(),
        "filtered to session hours"
    );
    if filtered.is_empty() {
        return Err(BarquantError::NoData {
            symbol: symbol.to_string(),
        });
    }
    Ok(filtered)
}

pub fn run_indicators_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    settings: &Settings,
    symbol: &str,
    output_path: &Path,
) -> Result<Vec<IndicatorColumn>, BarquantError> {
    let series = prepare_series(data_port, settings, symbol)?;
    let types = settings.indicators.indicator_types();
    let columns = compute_indicators(&series, &types)?;

    for (ty, column) in types.iter().zip(&columns) {
        let defined = column.defined_values().len();
        if defined == 0 {
            warn!(indicator = %ty, bars = series.len(), "no defined values, series shorter than warm-up");
        } else {
            info!(indicator = %ty, defined, "computed indicator");
        }
    }

    report_port.write_indicators(&series, &columns, output_path)?;
    Ok(columns)
}

pub fn run_trades_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    settings: &Settings,
    symbol: &str,
    signals: &[Signal],
    output_path: &Path,
) -> Result<Ledger, BarquantError> {
    let series = prepare_series(data_port, settings, symbol)?;
    let mut ledger = Ledger::new();
    replay_signals(&series, signals, &mut ledger)?;

    if let Some(position) = ledger.position() {
        warn!(
            direction = %position.direction,
            entry = position.entry_price,
            "position still open after replay"
        );
    }
    info!(trades = ledger.statistics().total_trades, "replay complete");

    report_port.write_trade_log(&ledger, output_path)?;
    Ok(ledger)
}

/// Human-readable ledger summary, one line per figure.
pub fn summary_lines(stats: &LedgerStatistics) -> Vec<String> {
    let mut lines = vec![
        format!("Total trades:   {}", stats.total_trades),
        format!("Winning trades: {}", stats.winning_trades),
        format!("Losing trades:  {}", stats.losing_trades()),
        format!("Win rate:       {:.2}%", stats.win_rate() * 100.0),
    ];
    if let Some(avg) = stats.average_pnl() {
        lines.push(format!("Average P/L:    {:+.2}%", avg));
    }
    lines.push(format!("Total P/L:      {:+.2}%", stats.total_pnl()));
    lines
}

fn run_indicators(
    config_path: &Path,
    symbol: Option<&str>,
    output: Option<&Path>,
) -> Result<(), BarquantError> {
    let settings = load_settings(config_path)?;
    let symbol = resolve_symbol(symbol, &settings)?;
    let output = output.unwrap_or(settings.output.indicators.as_path());

    let columns = run_indicators_pipeline(
        &data_adapter(&settings),
        &report_adapter(&settings),
        &settings,
        &symbol,
        output,
    )?;

    for column in &columns {
        let last = column
            .values
            .iter()
            .rev()
            .find_map(|p| p.value.map(|v| (p.timestamp, v)));
        match last {
            Some((ts, value)) => println!("{} last {:.4} at {}", column.indicator_type, value, ts),
            None => println!("{} undefined", column.indicator_type),
        }
    }
    println!("Wrote {}", output.display());
    Ok(())
}

fn run_trades(
    config_path: &Path,
    signals_path: &Path,
    symbol: Option<&str>,
    output: Option<&Path>,
) -> Result<(), BarquantError> {
    let settings = load_settings(config_path)?;
    let symbol = resolve_symbol(symbol, &settings)?;
    let output = output.unwrap_or(settings.output.trade_log.as_path());

    let data = data_adapter(&settings);
    let signals = data.read_signals(signals_path)?;
    info!(path = %signals_path.display(), signals = signals.len(), "loaded signals");

    let ledger = run_trades_pipeline(
        &data,
        &report_adapter(&settings),
        &settings,
        &symbol,
        &signals,
        output,
    )?;

    print!("{}", ledger.log_text());
    for line in summary_lines(ledger.statistics()) {
        println!("{line}");
    }
    println!("Wrote {}", output.display());
    Ok(())
}

fn run_info(config_path: &Path, symbol: Option<&str>) -> Result<(), BarquantError> {
    let settings = load_settings(config_path)?;
    let symbol = resolve_symbol(symbol, &settings)?;
    let series = prepare_series(&data_adapter(&settings), &settings, &symbol)?;

    if let Some((first, last)) = series.date_range() {
        println!("{}: {} bars, {} to {}", symbol, series.len(), first, last);
    }

    let days = series.trading_days();
    println!("Trading days: {}", days.len());

    let range = days.last().and_then(|day| {
        OpeningRange::from_session(&series.session(*day), settings.session.opening_range_bars)
    });
    match range {
        Some(r) => println!(
            "Opening range {} ({} bars): high {:.4}, low {:.4}, mid {:.4}",
            r.date,
            settings.session.opening_range_bars,
            r.high,
            r.low,
            r.mid()
        ),
        None => println!("Opening range: no session bars"),
    }
    Ok(())
}

fn run_levels(direction: &str, entry: f64, low: f64, high: f64) -> Result<(), BarquantError> {
    let direction: Direction = direction.parse()?;
    let levels = TradeLevels::from_band(direction, entry, low, high)?;
    println!("{} @ {:.4}", direction, entry);
    println!("{levels}");
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), BarquantError> {
    let settings = load_settings(config_path)?;

    println!("Data:       {}", settings.data.path.display());
    if let Some(symbol) = &settings.data.symbol {
        println!("Symbol:     {}", symbol);
    }
    if settings.session.regular_hours_only {
        println!(
            "Session:    {} to {}",
            settings.session.window.start, settings.session.window.end
        );
    }
    for ty in settings.indicators.indicator_types() {
        println!("Indicator:  {} -> {}", ty, ty.column_name());
    }
    println!("Configuration is valid.");
    Ok(())
}

fn run_merge(files: &[PathBuf], output: &Path, timestamp_format: &str) -> Result<(), BarquantError> {
    let adapter = CsvAdapter::new(PathBuf::from(".")).with_timestamp_format(timestamp_format);
    let merged = adapter.merge_csvs(files, Some(output))?;
    println!(
        "Merged {} files into {} ({} bars)",
        files.len(),
        output.display(),
        merged.len()
    );
    Ok(())
}
