//! lgrid-domain
//!
//! Pure data model for the periodic ledger grid: cells, column layouts, the
//! dense grid matrix, and the shapes persisted to the document store.
//! No I/O and no business rules beyond structural invariants.

pub mod cell;
pub mod grid;
pub mod layout;
pub mod sheet;

pub use cell::*;
pub use grid::*;
pub use layout::*;
pub use sheet::*;
