//! lgrid-config
//!
//! Session configuration for the ledger grid: acting identity, persistence
//! backend, debounce timing and number locale, plus disk persistence helpers.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{BackendKind, Config, LocaleSettings};
