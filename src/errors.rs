use lgrid_config::ConfigError;
use lgrid_core::CoreError;
use lgrid_domain::UnknownFormat;
use thiserror::Error;

/// Error type surfaced by grid sessions.
#[derive(Debug, Error)]
pub enum LedgerGridError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
    #[error(transparent)]
    UnknownFormat(#[from] UnknownFormat),
    #[error("A flush is already in flight")]
    FlushInProgress,
    #[error("Session is closed")]
    SessionClosed,
}
