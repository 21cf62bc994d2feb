//! Per-user file storage
//!
//! Each user owns one directory under the uploads root holding the region
//! images, the current-batch snapshot (`results.json`, fully overwritten per
//! upload), and the cached advice document (`advice.html`, plus the
//! plain-text `advice.md` variant written by explicit saves).

use crate::models::RegionResult;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Snapshot file name within a user directory
pub const RESULTS_FILE: &str = "results.json";

/// Cached advice document name
pub const ADVICE_HTML_FILE: &str = "advice.html";

/// Plain-text advice variant written by explicit saves
pub const ADVICE_TEXT_FILE: &str = "advice.md";

/// File storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed
    #[error("Storage I/O error at {0}: {1}")]
    Io(PathBuf, std::io::Error),

    /// Snapshot contents could not be serialized or parsed
    #[error("Malformed snapshot {0}: {1}")]
    Snapshot(PathBuf, serde_json::Error),
}

/// Handle on the uploads root directory
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    uploads_root: PathBuf,
}

impl SnapshotStore {
    pub fn new(uploads_root: impl Into<PathBuf>) -> Self {
        Self {
            uploads_root: uploads_root.into(),
        }
    }

    /// Uploads root this store was built on
    pub fn uploads_root(&self) -> &Path {
        &self.uploads_root
    }

    /// Directory owned by `user_id`
    pub fn user_dir(&self, user_id: &str) -> PathBuf {
        self.uploads_root.join(user_id)
    }

    /// Create the user directory if missing and return it
    pub fn ensure_user_dir(&self, user_id: &str) -> Result<PathBuf, StorageError> {
        let dir = self.user_dir(user_id);
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::Io(dir.clone(), e))?;
        Ok(dir)
    }

    /// Store one uploaded region image, returning its path
    pub fn write_image(
        &self,
        user_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let path = self.user_dir(user_id).join(filename);
        std::fs::write(&path, bytes).map_err(|e| StorageError::Io(path.clone(), e))?;
        Ok(path)
    }

    /// Overwrite the user's snapshot with a full batch result
    pub fn write_snapshot(
        &self,
        user_id: &str,
        results: &[RegionResult],
    ) -> Result<(), StorageError> {
        let path = self.user_dir(user_id).join(RESULTS_FILE);
        let contents = serde_json::to_vec_pretty(results)
            .map_err(|e| StorageError::Snapshot(path.clone(), e))?;
        std::fs::write(&path, contents).map_err(|e| StorageError::Io(path, e))
    }

    /// Read the user's snapshot, if one exists
    pub fn read_snapshot(&self, user_id: &str) -> Result<Option<serde_json::Value>, StorageError> {
        let path = self.user_dir(user_id).join(RESULTS_FILE);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(path, e)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| StorageError::Snapshot(path, e))
    }

    /// Read the cached advice document, if present
    pub fn read_advice(&self, user_id: &str) -> Result<Option<String>, StorageError> {
        let path = self.user_dir(user_id).join(ADVICE_HTML_FILE);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(path, e)),
        }
    }

    /// Cache a generated advice document
    pub fn write_advice(&self, user_id: &str, advice: &str) -> Result<(), StorageError> {
        let path = self.user_dir(user_id).join(ADVICE_HTML_FILE);
        std::fs::write(&path, advice).map_err(|e| StorageError::Io(path, e))
    }

    /// Explicit save: caller-supplied text replaces the cached document and
    /// is also persisted as the plain-text variant
    pub fn save_advice(&self, user_id: &str, advice: &str) -> Result<(), StorageError> {
        self.ensure_user_dir(user_id)?;
        self.write_advice(user_id, advice)?;
        let path = self.user_dir(user_id).join(ADVICE_TEXT_FILE);
        std::fs::write(&path, advice).map_err(|e| StorageError::Io(path, e))
    }
}
