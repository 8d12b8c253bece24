//! Persistence for the leaderboard document and the local record list.
//!
//! Both are whole-document JSON files. Writes go to a uniquely named sibling
//! temp file that is then renamed over the target, so neither a crash nor a
//! second writing process ever leaves a half-written store.
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::controllers::ranking::LocalRecord;
use crate::record::RankingRecord;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The single document backing the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingDocument {
    #[serde(default)]
    pub rankings: Vec<RankingRecord>,
    #[serde(default = "first_id")]
    pub next_id: u64,
}

const fn first_id() -> u64 {
    1
}

impl Default for RankingDocument {
    fn default() -> Self {
        Self {
            rankings: Vec::new(),
            next_id: first_id(),
        }
    }
}

impl RankingDocument {
    /// Hand out the next id. Ids are never reused, even after deletes.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Backend for the leaderboard document.
pub trait RankingStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the current document, or an empty one if nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored document cannot be read or parsed.
    fn load(&self) -> Result<RankingDocument, Self::Error>;

    /// Replace the stored document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn save(&self, document: &RankingDocument) -> Result<(), Self::Error>;
}

/// Backend for the player's own records, the only durable client-side state.
pub trait LocalRecordStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// # Errors
    ///
    /// Returns an error if the stored list cannot be read or parsed.
    fn load_local_records(&self) -> Result<Vec<LocalRecord>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the list cannot be written.
    fn save_local_records(&self, records: &[LocalRecord]) -> Result<(), Self::Error>;
}

/// A JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn json_error(&self, source: serde_json::Error) -> StorageError {
        StorageError::Json {
            path: self.path.clone(),
            source,
        }
    }

    /// Write `initial` unless the file already exists.
    ///
    /// Returns `true` when a new file was created.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub fn ensure<T: Serialize>(&self, initial: &T) -> Result<bool, StorageError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.write(initial)?;
        Ok(true)
    }

    /// Read and parse the file; a missing file yields `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read_or_default<T: DeserializeOwned + Default>(&self) -> Result<T, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(T::default()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| self.json_error(e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Pretty-print `value` to a uniquely named temp file next to the target,
    /// then rename it into place. Missing parent directories are created.
    ///
    /// Concurrent writers never see each other's partial output, but the last
    /// rename wins: callers serialize their read-modify-write cycles.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, the write or the rename fails.
    pub fn write<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), StorageError> {
        let payload = serde_json::to_vec_pretty(value).map_err(|e| self.json_error(e))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(&payload).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }
}

impl RankingStorage for JsonFile {
    type Error = StorageError;

    fn load(&self) -> Result<RankingDocument, Self::Error> {
        self.read_or_default()
    }

    fn save(&self, document: &RankingDocument) -> Result<(), Self::Error> {
        self.write(document)
    }
}

impl LocalRecordStorage for JsonFile {
    type Error = StorageError;

    fn load_local_records(&self) -> Result<Vec<LocalRecord>, Self::Error> {
        self.read_or_default()
    }

    fn save_local_records(&self, records: &[LocalRecord]) -> Result<(), Self::Error> {
        self.write(records)
    }
}

/// In-memory storage for tests and hosts without a filesystem.
///
/// Clones share the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    document: Rc<RefCell<RankingDocument>>,
    local: Rc<RefCell<Vec<LocalRecord>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RankingStorage for MemoryStorage {
    type Error = std::convert::Infallible;

    fn load(&self) -> Result<RankingDocument, Self::Error> {
        Ok(self.document.borrow().clone())
    }

    fn save(&self, document: &RankingDocument) -> Result<(), Self::Error> {
        *self.document.borrow_mut() = document.clone();
        Ok(())
    }
}

impl LocalRecordStorage for MemoryStorage {
    type Error = std::convert::Infallible;

    fn load_local_records(&self) -> Result<Vec<LocalRecord>, Self::Error> {
        Ok(self.local.borrow().clone())
    }

    fn save_local_records(&self, records: &[LocalRecord]) -> Result<(), Self::Error> {
        *self.local.borrow_mut() = records.to_vec();
        Ok(())
    }
}
