//! Storage trait definitions.

use crate::core::model::StoreDocument;
use crate::error::Result;

/// Persistence backend for the session store.
pub trait StoreBackend {
    /// Load the persisted document, `None` if nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read or parsed.
    fn load(&self) -> Result<Option<StoreDocument>>;

    /// Replace the persisted document.
    ///
    /// Readers see either the previous document or the new one, never a
    /// partial write.
    ///
    /// # Errors
    ///
    /// Returns `Error::Persistence` if the document cannot be written.
    fn save(&self, document: &StoreDocument) -> Result<()>;

    /// Human-readable location of the store, for reporting.
    fn location(&self) -> String;
}

/// Destination for downloaded files, addressed by alias.
pub trait FileSink {
    /// Whether a file with this alias is already present.
    fn exists(&self, alias: &str) -> bool;

    /// Write a file under `alias`, all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn write(&self, alias: &str, bytes: &[u8]) -> Result<()>;
}
