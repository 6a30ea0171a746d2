//! In-memory storage backend and file sink for testing.

use crate::core::model::StoreDocument;
use crate::error::{Error, Result};
use crate::storage::traits::{FileSink, StoreBackend};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage backend for testing.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    document: RwLock<Option<StoreDocument>>,
    saves: RwLock<usize>,
    fail_saves: bool,
}

impl MemoryBackend {
    /// Create a new, empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend already holding `document`.
    #[must_use]
    pub fn with_document(document: StoreDocument) -> Self {
        Self {
            document: RwLock::new(Some(document)),
            saves: RwLock::new(0),
            fail_saves: false,
        }
    }

    /// Create a backend whose saves always fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    /// Last saved document.
    #[must_use]
    pub fn document(&self) -> Option<StoreDocument> {
        self.document.read().unwrap().clone()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        *self.saves.read().unwrap()
    }
}

impl StoreBackend for MemoryBackend {
    fn load(&self) -> Result<Option<StoreDocument>> {
        Ok(self.document.read().unwrap().clone())
    }

    fn save(&self, document: &StoreDocument) -> Result<()> {
        if self.fail_saves {
            return Err(Error::Persistence("save refused".to_string()));
        }
        *self.document.write().unwrap() = Some(document.clone());
        *self.saves.write().unwrap() += 1;
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// In-memory download destination for testing.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: RwLock<HashMap<String, Vec<u8>>>,
    fail_writes: bool,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink whose writes always fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            files: RwLock::default(),
            fail_writes: true,
        }
    }

    /// Pre-populate a file.
    pub fn insert(&self, alias: &str, bytes: &[u8]) {
        self.files
            .write()
            .unwrap()
            .insert(alias.to_string(), bytes.to_vec());
    }

    /// Contents of a stored file.
    #[must_use]
    pub fn get(&self, alias: &str) -> Option<Vec<u8>> {
        self.files.read().unwrap().get(alias).cloned()
    }

    /// Number of stored files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.read().unwrap().len()
    }

    /// Whether no file is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FileSink for MemorySink {
    fn exists(&self, alias: &str) -> bool {
        self.files.read().unwrap().contains_key(alias)
    }

    fn write(&self, alias: &str, bytes: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Storage(std::io::Error::other("write refused")));
        }
        self.insert(alias, bytes);
        Ok(())
    }
}
