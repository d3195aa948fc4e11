//! Replays externally decided trade signals against a bar series.

use chrono::NaiveDateTime;
use std::str::FromStr;

use crate::domain::bar_series::BarSeries;
use crate::domain::error::BarquantError;
use crate::domain::ledger::Ledger;
use crate::domain::position::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    Open(Direction),
    Close,
}

impl FromStr for SignalAction {
    type Err = BarquantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("close") {
            return Ok(SignalAction::Close);
        }
        s.parse::<Direction>().map(SignalAction::Open).map_err(|_| {
            BarquantError::invalid_parameter(
                "signal action",
                format!("unknown action '{}' (expected LONG, SHORT or CLOSE)", s.trim()),
            )
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub timestamp: NaiveDateTime,
    pub action: SignalAction,
}

/// Applies `signals` in order, each at the close of the bar with the same
/// timestamp.
pub fn replay_signals(
    series: &BarSeries,
    signals: &[Signal],
    ledger: &mut Ledger,
) -> Result<(), BarquantError> {
    for signal in signals {
        let bar = series
            .index_of(signal.timestamp)
            .and_then(|i| series.bar_at(i))
            .ok_or(BarquantError::BarNotFound {
                timestamp: signal.timestamp,
            })?;

        match signal.action {
            SignalAction::Open(direction) => {
                ledger.open(direction, bar)?;
            }
            SignalAction::Close => {
                ledger.close(bar)?;
            }
        }
    }
    Ok(())
}
