#![doc(test(attr(deny(warnings))))]

//! Ledger Grid keeps a month of per-account payment records in a fixed
//! 300 x 50 grid, derives weekly subtotals and running balances, suggests
//! values for data entry, and syncs each account row to a document store.

pub mod errors;
pub mod session;
pub mod storage;
pub mod sync;
pub mod utils;

pub use errors::LedgerGridError;
pub use session::{
    EditOutcome, GridView, IgnoreReason, NullView, SessionCommand, SessionController,
    SessionRunner,
};
pub use sync::{SyncScheduler, SyncState, SyncStatus};

use std::{path::Path, sync::Once};

use lgrid_config::{Config, ConfigManager};

use lgrid_domain::{SheetFormat, YearMonth};

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Ledger Grid tracing initialized.");
    });
}

/// Validates a 1-based calendar month.
pub fn month(year: i32, month: u32) -> Result<YearMonth, LedgerGridError> {
    YearMonth::new(year, month).ok_or(LedgerGridError::InvalidMonth { year, month })
}

/// Parses a sheet format name such as `weekly` or `dailyline`.
pub fn sheet_format(name: &str) -> Result<SheetFormat, LedgerGridError> {
    Ok(name.parse()?)
}

/// Format a session opens with when the caller does not pick one.
pub fn default_sheet_format(config: &Config) -> Result<SheetFormat, LedgerGridError> {
    sheet_format(&config.default_format)
}

/// Loads `config/config.json` under `base_dir`, falling back to defaults when absent.
pub fn load_config(base_dir: &Path) -> Result<Config, LedgerGridError> {
    let manager = ConfigManager::with_base_dir(base_dir.to_path_buf())?;
    let config = manager.load()?;
    tracing::debug!(path = %manager.config_path().display(), "configuration loaded");
    Ok(config)
}
