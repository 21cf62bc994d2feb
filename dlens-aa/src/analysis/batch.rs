//! Upload batch coordination
//!
//! Runs the region pipeline for the three fixed regions of one upload,
//! persists the outcome, and builds the response summaries. Input validation
//! covers the whole batch before any file write or detector call: a missing
//! or disallowed file rejects the request with nothing persisted.
//!
//! Persistence is best-effort by policy: history-append and snapshot-write
//! failures are logged and suppressed here so the caller still receives the
//! computed results.

use crate::analysis::region::RegionPipeline;
use crate::db::analyses::AnalysisRecord;
use crate::db::folders;
use crate::models::{Region, RegionResult, RegionSummary};
use crate::storage::{SnapshotStore, StorageError};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

/// Accepted upload file extensions (case-insensitive)
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// One uploaded region image
#[derive(Debug, Clone)]
pub struct RegionUpload {
    pub region: Region,
    /// Client-supplied file name, used only for format validation
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Batch coordination errors
#[derive(Debug, Error)]
pub enum BatchError {
    /// A region's file is absent or fails the format check
    #[error("Invalid or missing file for {0}")]
    InvalidInput(Region),

    /// Upload could not be stored before analysis
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Analysis task failed to run
    #[error("Analysis task failed: {0}")]
    Internal(String),
}

/// Completed batch: full results plus the reduced response view
#[derive(Debug)]
pub struct BatchOutcome {
    pub user_id: String,
    /// Full per-region records, as written to the snapshot
    pub results: Vec<RegionResult>,
    /// Reduced summaries for the upload response
    pub details: Vec<RegionSummary>,
}

/// Runs one upload batch end to end
#[derive(Clone)]
pub struct BatchCoordinator {
    db: SqlitePool,
    pipeline: RegionPipeline,
    store: SnapshotStore,
}

impl BatchCoordinator {
    pub fn new(db: SqlitePool, pipeline: RegionPipeline, store: SnapshotStore) -> Self {
        Self {
            db,
            pipeline,
            store,
        }
    }

    /// Analyze one upload batch for `user_id`
    ///
    /// Regions run sequentially in the fixed left, middle, right order. A
    /// detector fault degrades its region's record; it does not abort the
    /// batch.
    pub async fn run(
        &self,
        user_id: &str,
        uploads: &[RegionUpload],
    ) -> Result<BatchOutcome, BatchError> {
        let ordered = order_uploads(uploads)?;

        let user_dir = self.store.ensure_user_dir(user_id)?;
        if let Err(e) =
            folders::ensure_user_folder(&self.db, user_id, &user_dir.to_string_lossy()).await
        {
            warn!(user_id, error = %e, "Failed to register user folder");
        }

        // One timestamp per batch; all three rows and the snapshot share it.
        let upload_time = dlens_common::time::upload_time_now();

        let mut results = Vec::with_capacity(Region::ALL.len());
        for upload in ordered {
            let stored_name = format!("{}_{}.jpg", user_id, upload.region);
            let image_path = self
                .store
                .write_image(user_id, &stored_name, &upload.bytes)?;

            let pipeline = self.pipeline.clone();
            let analysis = tokio::task::spawn_blocking(move || pipeline.analyze(&image_path))
                .await
                .map_err(|e| BatchError::Internal(e.to_string()))?;

            let record = AnalysisRecord {
                user_id,
                filename: &stored_name,
                face_part: upload.region,
                severity: &analysis.severity,
                confidence: analysis.confidence.db_value(),
                acne_count: analysis.acne_count,
                upload_time: &upload_time,
            };
            if let Err(e) = crate::db::analyses::append_analysis(&self.db, &record).await {
                warn!(
                    user_id,
                    region = %upload.region,
                    error = %e,
                    "Failed to append analysis history"
                );
            }

            results.push(RegionResult {
                face_part: upload.region,
                filename: stored_name,
                severity: analysis.severity,
                confidence: analysis.confidence,
                acne_count: analysis.acne_count,
                acne_types: analysis.acne_types,
                upload_time: upload_time.clone(),
            });
        }

        if let Err(e) = self.store.write_snapshot(user_id, &results) {
            warn!(user_id, error = %e, "Failed to write result snapshot");
        }

        info!(user_id, "Upload batch analyzed");

        let details = results.iter().map(RegionResult::summary).collect();
        Ok(BatchOutcome {
            user_id: user_id.to_string(),
            results,
            details,
        })
    }
}

/// File name passes the extension allow-list
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Validate the whole batch up front and fix the region order
///
/// Every region must have exactly one upload with an allowed file name;
/// the first violation rejects the batch.
fn order_uploads(uploads: &[RegionUpload]) -> Result<Vec<&RegionUpload>, BatchError> {
    Region::ALL
        .iter()
        .map(|region| {
            uploads
                .iter()
                .find(|upload| upload.region == *region)
                .filter(|upload| allowed_file(&upload.filename))
                .ok_or(BatchError::InvalidInput(*region))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(region: Region, filename: &str) -> RegionUpload {
        RegionUpload {
            region,
            filename: filename.to_string(),
            bytes: vec![0u8; 4],
        }
    }

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        assert!(allowed_file("face.jpg"));
        assert!(allowed_file("face.JPG"));
        assert!(allowed_file("face.jpeg"));
        assert!(allowed_file("face.PNG"));
        assert!(!allowed_file("face.gif"));
        assert!(!allowed_file("face.jpg.exe"));
        assert!(!allowed_file("face"));
        assert!(!allowed_file("face."));
    }

    #[test]
    fn ordering_follows_fixed_region_sequence() {
        let uploads = vec![
            upload(Region::Right, "r.jpg"),
            upload(Region::Left, "l.jpg"),
            upload(Region::Middle, "m.jpg"),
        ];
        let ordered = order_uploads(&uploads).unwrap();
        let regions: Vec<Region> = ordered.iter().map(|u| u.region).collect();
        assert_eq!(regions, Region::ALL.to_vec());
    }

    #[test]
    fn missing_region_rejects_batch() {
        let uploads = vec![upload(Region::Left, "l.jpg"), upload(Region::Middle, "m.jpg")];
        let err = order_uploads(&uploads).unwrap_err();
        assert!(matches!(err, BatchError::InvalidInput(Region::Right)));
    }

    #[test]
    fn disallowed_extension_rejects_batch() {
        let uploads = vec![
            upload(Region::Left, "l.jpg"),
            upload(Region::Middle, "m.bmp"),
            upload(Region::Right, "r.jpg"),
        ];
        let err = order_uploads(&uploads).unwrap_err();
        assert!(matches!(err, BatchError::InvalidInput(Region::Middle)));
    }
}
