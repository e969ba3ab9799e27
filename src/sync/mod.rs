//! Flush scheduling and the status line shown to the user.

pub mod scheduler;

use std::fmt;

pub use scheduler::{SyncScheduler, SyncState};

/// User-visible persistence status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Ready,
    Saving,
    /// Last flush succeeded on the named backend.
    Saved(&'static str),
    Error(String),
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Ready => f.write_str("Ready"),
            SyncStatus::Saving => f.write_str("Saving..."),
            SyncStatus::Saved(backend) => write!(f, "Saved ({})", backend),
            SyncStatus::Error(message) => write!(f, "Error: {}", message),
        }
    }
}
