//! Stop-loss / take-profit levels and risk/reward for a planned trade.

use std::fmt;

use crate::domain::error::BarquantError;
use crate::domain::position::Direction;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeLevels {
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl TradeLevels {
    pub fn new(
        direction: Direction,
        entry: f64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Result<Self, BarquantError> {
        if !(entry.is_finite() && entry > 0.0) {
            return Err(BarquantError::InvalidLevels {
                reason: format!("entry {entry} must be a positive price"),
            });
        }
        let ordered = match direction {
            Direction::Long => stop_loss < entry && entry < take_profit,
            Direction::Short => take_profit < entry && entry < stop_loss,
        };
        if !ordered {
            return Err(BarquantError::InvalidLevels {
                reason: format!(
                    "{direction} entry {entry} must lie strictly between stop {stop_loss} and target {take_profit}"
                ),
            });
        }
        Ok(Self {
            direction,
            entry,
            stop_loss,
            take_profit,
        })
    }

    /// Levels from a selected price band: a long risks down to the band's
    /// low and targets its high, a short the reverse.
    pub fn from_band(
        direction: Direction,
        entry: f64,
        band_low: f64,
        band_high: f64,
    ) -> Result<Self, BarquantError> {
        let (low, high) = if band_low <= band_high {
            (band_low, band_high)
        } else {
            (band_high, band_low)
        };
        match direction {
            Direction::Long => Self::new(direction, entry, low, high),
            Direction::Short => Self::new(direction, entry, high, low),
        }
    }

    pub fn risk(&self) -> f64 {
        (self.entry - self.stop_loss).abs()
    }

    pub fn reward(&self) -> f64 {
        (self.take_profit - self.entry).abs()
    }

    pub fn risk_reward(&self) -> f64 {
        self.reward() / self.risk()
    }

    pub fn stop_loss_percent(&self) -> f64 {
        self.risk() / self.entry * 100.0
    }

    pub fn take_profit_percent(&self) -> f64 {
        self.reward() / self.entry * 100.0
    }

    pub fn stop_hit(&self, price: f64) -> bool {
        match self.direction {
            Direction::Long => price <= self.stop_loss,
            Direction::Short => price >= self.stop_loss,
        }
    }

    pub fn target_hit(&self, price: f64) -> bool {
        match self.direction {
            Direction::Long => price >= self.take_profit,
            Direction::Short => price <= self.take_profit,
        }
    }
}

impl fmt::Display for TradeLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SL: {:.4} / {:.2}%, TP: {:.4} / {:.2}%, RR: {:.2}",
            self.stop_loss,
            self.stop_loss_percent(),
            self.take_profit,
            self.take_profit_percent(),
            self.risk_reward()
        )
    }
}
