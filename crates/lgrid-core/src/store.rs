use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex, MutexGuard,
    },
};

use lgrid_domain::{SheetFormat, SheetId};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::CoreError;

/// A schemaless document as stored by a [`DocumentStore`].
pub type Document = Value;

/// Abstraction over hierarchical document stores addressed by `/`-separated paths.
pub trait DocumentStore: Send + Sync {
    fn get_document(&self, path: &str) -> Result<Option<Document>, CoreError>;
    /// Writes `document` at `path`. With `merge`, object fields are merged into
    /// the existing document instead of replacing it.
    fn set_document(&self, path: &str, document: Document, merge: bool) -> Result<(), CoreError>;
    /// Returns the documents stored directly under `collection`, ordered by path.
    fn list_documents(&self, collection: &str) -> Result<Vec<Document>, CoreError>;
}

/// Key/value store holding one serialized blob per key.
pub trait BlobStore: Send + Sync {
    fn get_blob(&self, key: &str) -> Result<Option<String>, CoreError>;
    fn set_blob(&self, key: &str, blob: &str) -> Result<(), CoreError>;
}

pub fn sheet_path(identity: &str, sheet: &SheetId) -> String {
    format!("users/{}/sheets/{}", identity, sheet)
}

pub fn accounts_collection(identity: &str, sheet: &SheetId) -> String {
    format!("{}/accounts", sheet_path(identity, sheet))
}

pub fn row_path(identity: &str, sheet: &SheetId, row: usize) -> String {
    format!("{}/row_{}", accounts_collection(identity, sheet), row)
}

pub fn column_config_path(format: SheetFormat) -> String {
    format!("primaryAccounts/{}/settings/columnConfig", format.as_str())
}

/// Reads and deserializes a typed document.
pub fn read_document<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    path: &str,
) -> Result<Option<T>, CoreError> {
    match store.get_document(path)? {
        Some(document) => Ok(Some(serde_json::from_value(document)?)),
        None => Ok(None),
    }
}

pub fn write_document<T: Serialize>(
    store: &dyn DocumentStore,
    path: &str,
    value: &T,
    merge: bool,
) -> Result<(), CoreError> {
    store.set_document(path, serde_json::to_value(value)?, merge)
}

/// Deep-merges `incoming` into `existing`; non-object values replace.
pub fn merge_documents(existing: &mut Document, incoming: Document) {
    match (existing, incoming) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(slot) => merge_documents(slot, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn is_direct_child(path: &str, collection: &str) -> bool {
    path.strip_prefix(collection)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(|name| !name.is_empty() && !name.contains('/'))
        .unwrap_or(false)
}

/// In-process document store used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<BTreeMap<String, Document>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set_document` calls that succeeded.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every subsequent write fail until switched back.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn paths(&self) -> Result<Vec<String>, CoreError> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Document>>, CoreError> {
        self.documents
            .lock()
            .map_err(|_| CoreError::Store("memory store lock poisoned".into()))
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get_document(&self, path: &str) -> Result<Option<Document>, CoreError> {
        Ok(self.lock()?.get(path).cloned())
    }

    fn set_document(&self, path: &str, document: Document, merge: bool) -> Result<(), CoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CoreError::Store(format!("write to {} rejected", path)));
        }
        let mut documents = self.lock()?;
        match documents.get_mut(path) {
            Some(existing) if merge => merge_documents(existing, document),
            _ => {
                documents.insert(path.to_string(), document);
            }
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn list_documents(&self, collection: &str) -> Result<Vec<Document>, CoreError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|(path, _)| is_direct_child(path, collection))
            .map(|(_, document)| document.clone())
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get_blob(&self, key: &str) -> Result<Option<String>, CoreError> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| CoreError::Store("memory store lock poisoned".into()))?;
        Ok(blobs.get(key).cloned())
    }

    fn set_blob(&self, key: &str, blob: &str) -> Result<(), CoreError> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| CoreError::Store("memory store lock poisoned".into()))?;
        blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}
