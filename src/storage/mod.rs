//! Filesystem backends selected from configuration.

use std::{path::Path, sync::Arc};

use lgrid_config::{BackendKind, Config};
use lgrid_core::SheetBackend;
use lgrid_storage_json::{JsonBlobStore, JsonDocumentStore};

use crate::{errors::LedgerGridError, utils::app_data_dir};

/// Opens the configured backend under the session data directory.
pub fn open_backend(config: &Config) -> Result<SheetBackend, LedgerGridError> {
    open_backend_at(config.backend, &app_data_dir(config))
}

pub fn open_backend_at(kind: BackendKind, root: &Path) -> Result<SheetBackend, LedgerGridError> {
    let backend = match kind {
        BackendKind::Documents => {
            SheetBackend::Documents(Arc::new(JsonDocumentStore::new(root.join("documents"))?))
        }
        BackendKind::Local => SheetBackend::Local(Arc::new(JsonBlobStore::new(root.join("local"))?)),
    };
    tracing::debug!(root = %root.display(), backend = backend.label(), "opened sheet backend");
    Ok(backend)
}
