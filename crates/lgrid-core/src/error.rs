use lgrid_domain::{GridError, LayoutError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("Invalid layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("Persistence error: {0}")]
    Store(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serde(err.to_string())
    }
}
