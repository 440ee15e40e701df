//! Domain error types.

use chrono::NaiveDateTime;

use crate::domain::universe::UniverseError;

/// Top-level error type for sigtrader.
///
/// The first four variants come out of the core and are raised before any bar
/// is simulated. The rest belong to the adapters around it.
#[derive(Debug, thiserror::Error)]
pub enum SigtraderError {
    #[error("invalid strategy config `{field}`: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error(
        "non-monotonic timestamps for {symbol} at bar {index}: {current} does not follow {previous}"
    )]
    NonMonotonicTimestamp {
        symbol: String,
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("non-positive price for {symbol} at bar {index}")]
    InvalidPrice { symbol: String, index: usize },

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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SigtraderError {
    pub(crate) fn invalid_config(field: &str, reason: impl Into<String>) -> Self {
        SigtraderError::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit status for this error: 1 I/O, 2 configuration, 3 data
    /// source, 5 unusable price series.
    pub fn exit_status(&self) -> u8 {
        match self {
            SigtraderError::Io(_) => 1,
            SigtraderError::ConfigParse { .. }
            | SigtraderError::ConfigMissing { .. }
            | SigtraderError::ConfigInvalid { .. }
            | SigtraderError::InvalidConfig { .. } => 2,
            SigtraderError::Universe(UniverseError::NoUsableSymbols) => 3,
            SigtraderError::Universe(_) => 2,
            SigtraderError::Data { .. } | SigtraderError::NoData { .. } => 3,
            SigtraderError::InsufficientData { .. }
            | SigtraderError::NonMonotonicTimestamp { .. }
            | SigtraderError::InvalidPrice { .. } => 5,
        }
    }
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
