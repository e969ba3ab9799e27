use std::{
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use lgrid_core::{
    store::{merge_documents, Document},
    BlobStore, CoreError, DocumentStore,
};
use tracing::warn;

const DOCUMENT_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// Filesystem-backed document store: each document is one JSON file whose
/// path mirrors the document path, so a collection is a directory.
#[derive(Debug)]
pub struct JsonDocumentStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonDocumentStore {
    pub fn new(root: PathBuf) -> Result<Self, CoreError> {
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self, path: &str) -> Result<PathBuf, CoreError> {
        let dir = self.collection_dir(path)?;
        let mut file = dir.into_os_string();
        file.push(".");
        file.push(DOCUMENT_EXTENSION);
        Ok(PathBuf::from(file))
    }

    fn collection_dir(&self, path: &str) -> Result<PathBuf, CoreError> {
        let mut resolved = self.root.clone();
        for segment in path.split('/') {
            validate_segment(path, segment)?;
            resolved.push(segment);
        }
        Ok(resolved)
    }
}

impl DocumentStore for JsonDocumentStore {
    fn get_document(&self, path: &str) -> Result<Option<Document>, CoreError> {
        read_json(&self.document_path(path)?)
    }

    fn set_document(&self, path: &str, document: Document, merge: bool) -> Result<(), CoreError> {
        let file = self.document_path(path)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| CoreError::Store("document store lock poisoned".into()))?;
        let existing = if merge {
            match read_json(&file) {
                Ok(existing) => existing,
                Err(CoreError::Serde(err)) => {
                    warn!(file = %file.display(), error = %err, "replacing unreadable document");
                    None
                }
                Err(err) => return Err(err),
            }
        } else {
            None
        };
        let document = match existing {
            Some(mut existing) => {
                merge_documents(&mut existing, document);
                existing
            }
            _ => document,
        };
        let tmp = tmp_path(&file);
        write_atomic(&tmp, &serde_json::to_string_pretty(&document)?)?;
        fs::rename(&tmp, &file)?;
        Ok(())
    }

    fn list_documents(&self, collection: &str) -> Result<Vec<Document>, CoreError> {
        let dir = self.collection_dir(collection)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(DOCUMENT_EXTENSION)
            {
                files.push(path);
            }
        }
        files.sort();
        let mut documents = Vec::with_capacity(files.len());
        for file in files {
            match read_json(&file) {
                Ok(Some(document)) => documents.push(document),
                Ok(None) => {}
                Err(CoreError::Serde(err)) => {
                    warn!(file = %file.display(), error = %err, "skipping unreadable document");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(documents)
    }
}

/// One JSON file per key under a single directory.
#[derive(Debug, Clone)]
pub struct JsonBlobStore {
    root: PathBuf,
}

impl JsonBlobStore {
    pub fn new(root: PathBuf) -> Result<Self, CoreError> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn blob_path(&self, key: &str) -> Result<PathBuf, CoreError> {
        if key.contains('/') {
            return Err(CoreError::Store(format!("invalid blob key '{}'", key)));
        }
        validate_segment(key, key)?;
        Ok(self
            .root
            .join(format!("{}.{}", key, DOCUMENT_EXTENSION)))
    }
}

impl BlobStore for JsonBlobStore {
    fn get_blob(&self, key: &str) -> Result<Option<String>, CoreError> {
        match fs::read_to_string(self.blob_path(key)?) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set_blob(&self, key: &str, blob: &str) -> Result<(), CoreError> {
        let path = self.blob_path(key)?;
        let tmp = tmp_path(&path);
        write_atomic(&tmp, blob)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn validate_segment(path: &str, segment: &str) -> Result<(), CoreError> {
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
        return Err(CoreError::Store(format!("invalid document path '{}'", path)));
    }
    Ok(())
}

fn read_json(path: &Path) -> Result<Option<Document>, CoreError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
