//! Trade ledger: one open position at a time, closed-trade history and
//! cumulative statistics.
//!
//! Flat --open--> Open --close--> Flat. Statistics only ever grow; clearing
//! them is an explicit `reset`.

use chrono::NaiveDateTime;

use crate::domain::bar::Bar;
use crate::domain::error::BarquantError;
use crate::domain::position::{average, Direction, Position};

const LOG_DATE_FORMAT: &str = "%d/%m/%y";

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub sequence_number: usize,
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_timestamp: NaiveDateTime,
    pub exit_price: f64,
    pub exit_timestamp: NaiveDateTime,
    pub pnl_percent: f64,
}

impl TradeRecord {
    pub fn is_win(&self) -> bool {
        self.pnl_percent > 0.0
    }

    /// `Trade <n>: <TYPE> @ <entry> on <date> CLOSED @ <exit> on <date> for P/L of <pp.pp>%`
    ///
    /// P/L has no forced sign; a SHORT at break-even prints `-0.00`.
    pub fn log_line(&self) -> String {
        format!(
            "Trade {}: {} @ {} on {} CLOSED @ {} on {} for P/L of {:.2}%",
            self.sequence_number,
            self.direction,
            format_price(self.entry_price),
            self.entry_timestamp.format(LOG_DATE_FORMAT),
            format_price(self.exit_price),
            self.exit_timestamp.format(LOG_DATE_FORMAT),
            self.pnl_percent,
        )
    }
}

/// Integral prices keep one decimal (`100.0`), others print as-is.
fn format_price(price: f64) -> String {
    if price.fract() == 0.0 && price.is_finite() {
        format!("{:.1}", price)
    } else {
        format!("{}", price)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerStatistics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub profit_loss_log: Vec<f64>,
}

impl LedgerStatistics {
    pub fn losing_trades(&self) -> usize {
        self.total_trades - self.winning_trades
    }

    /// Fraction of trades with positive P/L, 0.0 before any trade.
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            0.0
        } else {
            self.winning_trades as f64 / self.total_trades as f64
        }
    }

    pub fn average_pnl(&self) -> Option<f64> {
        average(&self.profit_loss_log)
    }

    pub fn total_pnl(&self) -> f64 {
        self.profit_loss_log.iter().sum()
    }
}

/// Closes `position` at the close of `bar`, updating `stats`.
///
/// Returns the immutable trade record and its log line.
pub fn close_trade(
    position: Position,
    bar: &Bar,
    stats: &mut LedgerStatistics,
) -> (TradeRecord, String) {
    stats.total_trades += 1;

    let pnl_percent = position.pnl_percent(bar.close);
    let record = TradeRecord {
        sequence_number: stats.total_trades,
        direction: position.direction,
        entry_price: position.entry_price,
        entry_timestamp: position.entry_timestamp,
        exit_price: bar.close,
        exit_timestamp: bar.timestamp,
        pnl_percent,
    };

    stats.profit_loss_log.push(pnl_percent);
    if record.is_win() {
        stats.winning_trades += 1;
    }

    let line = record.log_line();
    (record, line)
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    position: Option<Position>,
    statistics: LedgerStatistics,
    trades: Vec<TradeRecord>,
    log: Vec<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn statistics(&self) -> &LedgerStatistics {
        &self.statistics
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn log_lines(&self) -> &[String] {
        &self.log
    }

    /// The whole log, one line per closed trade, newline-terminated.
    pub fn log_text(&self) -> String {
        self.log.iter().map(|l| format!("{l}\n")).collect()
    }

    pub fn open(&mut self, direction: Direction, bar: &Bar) -> Result<&Position, BarquantError> {
        self.open_position(Position::open(direction, bar))
    }

    pub fn open_position(&mut self, position: Position) -> Result<&Position, BarquantError> {
        if self.position.is_some() {
            return Err(BarquantError::PositionAlreadyOpen);
        }
        Ok(&*self.position.insert(position))
    }

    pub fn close(&mut self, bar: &Bar) -> Result<&TradeRecord, BarquantError> {
        let position = self.position.take().ok_or(BarquantError::NoOpenPosition)?;
        let (record, line) = close_trade(position, bar, &mut self.statistics);
        self.log.push(line);
        self.trades.push(record);
        self.trades.last().ok_or(BarquantError::NoOpenPosition)
    }

    /// Drops the open position, history and statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(15, 55, 0)
                .unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: None,
        }
    }

    #[test]
    fn long_round_trip() {
        let mut ledger = Ledger::new();
        ledger.open(Direction::Long, &bar(2, 100.0)).unwrap();
        let trade = ledger.close(&bar(5, 110.0)).unwrap().clone();

        assert_eq!(trade.pnl_percent, 10.0);
        assert_eq!(trade.sequence_number, 1);
        let stats = ledger.statistics();
        assert_eq!(stats.total_trades, 1);
        assert_eq!(stats.winning_trades, 1);

        let line = &ledger.log_lines()[0];
        assert!(line.contains("LONG"));
        assert!(line.contains("10.00%"));
        assert_eq!(
            line,
            "Trade 1: LONG @ 100.0 on 02/01/24 CLOSED @ 110.0 on 05/01/24 for P/L of 10.00%"
        );
        assert!(ledger.is_flat());
    }

    #[test]
    fn short_round_trip() {
        let mut ledger = Ledger::new();
        ledger.open(Direction::Short, &bar(2, 100.0)).unwrap();
        let trade = ledger.close(&bar(3, 90.0)).unwrap();

        assert_eq!(trade.pnl_percent, 10.0);
        assert_eq!(ledger.statistics().winning_trades, 1);
        assert!(ledger.log_lines()[0].contains("SHORT"));
    }

    #[test]
    fn break_even_is_not_a_win() {
        let mut ledger = Ledger::new();
        ledger.open(Direction::Long, &bar(2, 100.0)).unwrap();
        ledger.close(&bar(3, 100.0)).unwrap();

        let stats = ledger.statistics();
        assert_eq!(stats.total_trades, 1);
        assert_eq!(stats.winning_trades, 0);
        assert_eq!(stats.profit_loss_log, vec![0.0]);
        assert!(ledger.log_lines()[0].ends_with("for P/L of 0.00%"));
    }

    #[test]
    fn short_break_even_logs_negative_zero() {
        let mut ledger = Ledger::new();
        ledger.open(Direction::Short, &bar(2, 100.0)).unwrap();
        ledger.close(&bar(3, 100.0)).unwrap();

        assert_eq!(ledger.statistics().winning_trades, 0);
        assert!(ledger.log_lines()[0].ends_with("for P/L of -0.00%"));
    }

    #[test]
    fn close_returns_latest_record() {
        let mut ledger = Ledger::new();
        ledger.open(Direction::Long, &bar(2, 100.0)).unwrap();
        ledger.close(&bar(3, 105.0)).unwrap();
        ledger.open(Direction::Short, &bar(4, 105.0)).unwrap();
        let trade = ledger.close(&bar(5, 100.0)).unwrap();

        assert_eq!(trade.sequence_number, 2);
        assert_eq!(trade.direction, Direction::Short);
        assert_eq!(trade.pnl_percent, 4.76);
    }

    #[test]
    fn tie_rounds_to_even_in_log() {
        let mut ledger = Ledger::new();
        ledger.open(Direction::Long, &bar(2, 800.0)).unwrap();
        ledger.close(&bar(3, 801.0)).unwrap();
        assert_eq!(ledger.statistics().profit_loss_log, vec![0.12]);
        assert!(ledger.log_lines()[0].ends_with("for P/L of 0.12%"));
    }

    #[test]
    fn losing_trade_log_sign() {
        let mut ledger = Ledger::new();
        ledger.open(Direction::Long, &bar(2, 200.0)).unwrap();
        ledger.close(&bar(3, 190.5)).unwrap();
        let line = &ledger.log_lines()[0];
        assert!(line.contains("CLOSED @ 190.5 on 03/01/24"));
        assert!(line.ends_with("for P/L of -4.75%"));
        assert_eq!(ledger.statistics().losing_trades(), 1);
    }

    #[test]
    fn close_without_position_fails() {
        let mut ledger = Ledger::new();
        let err = ledger.close(&bar(2, 100.0)).unwrap_err();
        assert!(matches!(err, BarquantError::NoOpenPosition));
        assert_eq!(ledger.statistics().total_trades, 0);
    }

    #[test]
    fn open_twice_fails() {
        let mut ledger = Ledger::new();
        ledger.open(Direction::Long, &bar(2, 100.0)).unwrap();
        let err = ledger.open(Direction::Short, &bar(3, 101.0)).unwrap_err();
        assert!(matches!(err, BarquantError::PositionAlreadyOpen));
        assert_eq!(ledger.position().unwrap().direction, Direction::Long);
    }

    #[test]
    fn statistics_accumulate() {
        let mut ledger = Ledger::new();
        let moves = [
            (Direction::Long, 100.0, 105.0),
            (Direction::Short, 105.0, 110.0),
            (Direction::Long, 110.0, 110.0),
            (Direction::Short, 110.0, 99.0),
        ];
        for (i, (dir, entry, exit)) in moves.iter().enumerate() {
            let day = 2 + 2 * i as u32;
            ledger.open(*dir, &bar(day, *entry)).unwrap();
            ledger.close(&bar(day + 1, *exit)).unwrap();
        }

        let stats = ledger.statistics();
        assert_eq!(stats.total_trades, 4);
        assert_eq!(stats.profit_loss_log.len(), 4);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.profit_loss_log, vec![5.0, -4.76, 0.0, 10.0]);
        assert_eq!(stats.win_rate(), 0.5);
        assert_eq!(stats.average_pnl(), Some(2.56));
        let numbers: Vec<usize> = ledger.trades().iter().map(|t| t.sequence_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(ledger.log_text().lines().count(), 4);
    }

    #[test]
    fn close_trade_threads_statistics() {
        let mut stats = LedgerStatistics::default();
        let position = Position::open(Direction::Long, &bar(2, 50.0));
        let (record, line) = close_trade(position, &bar(4, 55.0), &mut stats);

        assert_eq!(record.pnl_percent, 10.0);
        assert_eq!(stats.total_trades, 1);
        assert_eq!(stats.winning_trades, 1);
        assert_eq!(line, record.log_line());
    }

    #[test]
    fn reset_clears_everything() {
        let mut ledger = Ledger::new();
        ledger.open(Direction::Long, &bar(2, 100.0)).unwrap();
        ledger.close(&bar(3, 101.0)).unwrap();
        ledger.open(Direction::Long, &bar(4, 100.0)).unwrap();
        ledger.reset();

        assert!(ledger.is_flat());
        assert_eq!(ledger.statistics(), &LedgerStatistics::default());
        assert!(ledger.trades().is_empty());
        assert!(ledger.log_text().is_empty());
    }

    #[test]
    fn empty_statistics() {
        let stats = LedgerStatistics::default();
        assert_eq!(stats.win_rate(), 0.0);
        assert_eq!(stats.average_pnl(), None);
        assert_eq!(stats.total_pnl(), 0.0);
    }

    #[test]
    fn format_price_keeps_decimals() {
        assert_eq!(format_price(100.0), "100.0");
        assert_eq!(format_price(512.34), "512.34");
    }
}
