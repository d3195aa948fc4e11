//! Domain error types.

use chrono::NaiveDateTime;

/// Top-level error type for barquant.
#[derive(Debug, thiserror::Error)]
pub enum BarquantError {
    #[error("bars out of order at index {index}: {current} is before {previous}")]
    UnsortedSeries {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("duplicate timestamp {timestamp} at index {index}")]
    DuplicateTimestamp {
        index: usize,
        timestamp: NaiveDateTime,
    },

    #[error("a position is already open")]
    PositionAlreadyOpen,

    #[error("no open position to close")]
    NoOpenPosition,

    #[error("no bar at {timestamp}")]
    BarNotFound { timestamp: NaiveDateTime },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("invalid trade levels: {reason}")]
    InvalidLevels { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BarquantError {
    pub(crate) fn data(reason: impl Into<String>) -> Self {
        BarquantError::Data {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        BarquantError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit status for this error family.
    pub fn exit_status(&self) -> u8 {
        match self {
            BarquantError::Io(_) => 1,
            BarquantError::ConfigParse { .. }
            | BarquantError::ConfigMissing { .. }
            | BarquantError::ConfigInvalid { .. } => 2,
            BarquantError::Data { .. }
            | BarquantError::UnsortedSeries { .. }
            | BarquantError::DuplicateTimestamp { .. } => 3,
            BarquantError::PositionAlreadyOpen
            | BarquantError::NoOpenPosition
            | BarquantError::BarNotFound { .. }
            | BarquantError::InvalidParameter { .. }
            | BarquantError::InvalidLevels { .. } => 4,
            BarquantError::NoData { .. } => 5,
        }
    }
}

impl From<&BarquantError> for std::process::ExitCode {
    fn from(err: &BarquantError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
