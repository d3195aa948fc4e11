//! Position tracking.

use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

use crate::domain::bar::Bar;
use crate::domain::error::BarquantError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => f.write_str("LONG"),
            Direction::Short => f.write_str("SHORT"),
        }
    }
}

impl FromStr for Direction {
    type Err = BarquantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" | "BUY" => Ok(Direction::Long),
            "SHORT" | "SELL" => Ok(Direction::Short),
            other => Err(BarquantError::invalid_parameter(
                "direction",
                format!("unknown direction '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_timestamp: NaiveDateTime,
}

impl Position {
    /// Opens at the close of `bar`.
    pub fn open(direction: Direction, bar: &Bar) -> Self {
        Self {
            direction,
            entry_price: bar.close,
            entry_timestamp: bar.timestamp,
        }
    }

    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }

    pub fn is_short(&self) -> bool {
        self.direction == Direction::Short
    }

    /// Signed return in percent, rounded to 2 dp; positive means profit.
    /// A SHORT at break-even gives -0.0.
    pub fn pnl_percent(&self, exit_price: f64) -> f64 {
        self.direction.sign() * percent_change(self.entry_price, exit_price)
    }
}

/// ((after - before) / before) * 100, rounded to 2 dp.
pub fn percent_change(before: f64, after: f64) -> f64 {
    round2((after - before) / before * 100.0)
}

/// Mean rounded to 2 dp; `None` for an empty slice.
pub fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(round2(values.iter().sum::<f64>() / values.len() as f64))
}

/// Two decimal places, exact ties to even.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: None,
        }
    }

    #[test]
    fn open_uses_bar_close() {
        let pos = Position::open(Direction::Long, &bar(101.5));
        assert_eq!(pos.entry_price, 101.5);
        assert_eq!(pos.entry_timestamp, bar(0.0).timestamp);
        assert!(pos.is_long());
        assert!(!pos.is_short());
    }

    #[test]
    fn long_pnl() {
        let pos = Position::open(Direction::Long, &bar(100.0));
        assert_eq!(pos.pnl_percent(110.0), 10.0);
        assert_eq!(pos.pnl_percent(95.0), -5.0);
    }

    #[test]
    fn short_pnl() {
        let pos = Position::open(Direction::Short, &bar(100.0));
        assert_eq!(pos.pnl_percent(90.0), 10.0);
        assert_eq!(pos.pnl_percent(105.0), -5.0);
    }

    #[test]
    fn short_break_even_is_negative_zero() {
        let pos = Position::open(Direction::Short, &bar(100.0));
        let pnl = pos.pnl_percent(100.0);
        assert_eq!(pnl, 0.0);
        assert!(pnl.is_sign_negative());
    }

    #[test]
    fn percent_change_rounds() {
        assert_eq!(percent_change(3.0, 4.0), 33.33);
        assert_eq!(percent_change(3.0, 2.0), -33.33);
        assert_eq!(percent_change(200.0, 200.0), 0.0);
    }

    #[test]
    fn percent_change_ties_round_to_even() {
        assert_eq!(percent_change(800.0, 801.0), 0.12);
        assert_eq!(percent_change(800.0, 799.0), -0.12);
        assert_eq!(round2(0.375), 0.38);
    }

    #[test]
    fn average_ties_round_to_even() {
        assert_eq!(average(&[0.125]), Some(0.12));
    }

    #[test]
    fn average_rounds_and_handles_empty() {
        assert_eq!(average(&[1.0, 2.0, 2.0]), Some(1.67));
        assert_eq!(average(&[]), None);
    }

    #[test]
    fn direction_parse_accepts_buy_sell() {
        assert_eq!("BUY".parse::<Direction>().unwrap(), Direction::Long);
        assert_eq!("long".parse::<Direction>().unwrap(), Direction::Long);
        assert_eq!("SELL".parse::<Direction>().unwrap(), Direction::Short);
        assert_eq!(" short ".parse::<Direction>().unwrap(), Direction::Short);
        assert!("hold".parse::<Direction>().is_err());
    }

    #[test]
    fn direction_display() {
        assert_eq!(Direction::Long.to_string(), "LONG");
        assert_eq!(Direction::Short.to_string(), "SHORT");
    }
}
