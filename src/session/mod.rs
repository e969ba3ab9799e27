//! A grid session: one sheet open for editing by one identity.

pub mod controller;
pub mod runner;
pub mod view;

pub use controller::{EditOutcome, IgnoreReason, SessionController};
pub use runner::{SessionCommand, SessionRunner};
pub use view::{GridView, NullView};
