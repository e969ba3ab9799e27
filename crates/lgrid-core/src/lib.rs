//! lgrid-core
//!
//! Computation and synchronization rules for the ledger grid.
//! Depends on lgrid-domain. No terminal I/O; storage is reached only through
//! the [`store::DocumentStore`] and [`store::BlobStore`] traits.

pub mod derived;
pub mod error;
pub mod layout_builder;
pub mod number;
pub mod store;
pub mod suggestion;
pub mod sync;
pub mod totals;

pub use derived::{DerivedColumnEngine, DerivedUpdate, EditGate, GateState, GateToken};
pub use error::CoreError;
pub use layout_builder::{build_layout, default_fixed_labels};
pub use number::{cell_amount, normalize_input, parse_amount, NumberLocale};
pub use store::{BlobStore, DocumentStore, MemoryBlobStore, MemoryDocumentStore};
pub use suggestion::{Suggestion, SuggestionAdvisor, SuggestionChoice};
pub use sync::{FlushJob, FlushOutcome, FlushReport, LoadReport, PersistenceSync, SheetBackend};
pub use totals::{balance_status, column_totals, BalanceStatus};
