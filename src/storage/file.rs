//! File-based storage backend and download directory.

use crate::core::model::StoreDocument;
use crate::error::{Error, Result};
use crate::storage::traits::{FileSink, StoreBackend};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write `contents` next to `path` under a temporary name, then rename over it.
///
/// The rename is atomic on the same filesystem, so a crash leaves either the
/// old file or the new one.
fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp = path.with_file_name(temp_name);

    fs::write(&temp, contents)?;
    fs::rename(&temp, path)
}

/// JSON store file with atomic writes.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Create a backend for the store at `path`.
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Open the store at `path` for reading, without creating anything.
    #[must_use]
    pub fn open(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoreBackend for FileBackend {
    fn load(&self) -> Result<Option<StoreDocument>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        let document: StoreDocument = serde_json::from_str(&contents)?;
        Ok(Some(document))
    }

    fn save(&self, document: &StoreDocument) -> Result<()> {
        let contents = serde_json::to_string_pretty(document)?;
        write_atomic(&self.path, contents.as_bytes())
            .map_err(|e| Error::Persistence(format!("{}: {e}", self.path.display())))?;
        debug!(
            path = %self.path.display(),
            sessions = document.sessions.len(),
            "store saved"
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Local directory receiving downloaded files.
#[derive(Debug)]
pub struct LocalDir {
    dir: PathBuf,
}

impl LocalDir {
    /// Use `dir` as download directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }
}

impl FileSink for LocalDir {
    fn exists(&self, alias: &str) -> bool {
        self.dir.join(alias).exists()
    }

    fn write(&self, alias: &str, bytes: &[u8]) -> Result<()> {
        write_atomic(&self.dir.join(alias), bytes)?;
        Ok(())
    }
}
