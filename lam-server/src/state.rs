use lam_core::{JsonFile, RankingDocument, RankingService, StorageError};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared by every handler. Each request holds the lock for its whole
/// load → change → save cycle, so concurrent writes never lose updates.
/// Handlers take it with `blocking_lock` on the blocking pool, since the
/// store does synchronous file I/O.
pub struct AppState {
    pub service: Mutex<RankingService<JsonFile>>,
}

impl AppState {
    /// Open the store at `db_path`, creating the directory and an empty
    /// document when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or initial document cannot be created.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Arc<Self>, StorageError> {
        let file = JsonFile::new(db_path);
        if file.ensure(&RankingDocument::default())? {
            info!("Created leaderboard store at {}", file.path().display());
        } else {
            info!("Using leaderboard store at {}", file.path().display());
        }

        Ok(Arc::new(Self {
            service: Mutex::new(RankingService::new(file)),
        }))
    }
}
