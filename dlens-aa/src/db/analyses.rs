//! Append-only analysis history
//!
//! One row per region per batch. Rows are never updated or deleted, so
//! history survives snapshot overwrites from later uploads.

use crate::models::Region;
use dlens_common::Result;
use sqlx::SqlitePool;

/// One history row
#[derive(Debug, Clone)]
pub struct AnalysisRecord<'a> {
    pub user_id: &'a str,
    pub filename: &'a str,
    pub face_part: Region,
    /// Severity label (or error description for degraded regions)
    pub severity: &'a str,
    /// Numeric confidence; "N/A" is stored as 0.0
    pub confidence: f64,
    pub acne_count: u32,
    pub upload_time: &'a str,
}

/// Append one region's analysis to the history
pub async fn append_analysis(pool: &SqlitePool, record: &AnalysisRecord<'_>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO acne_analysis
          (user_id, filename, face_part, severity, confidence, acne_count, upload_time)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.user_id)
    .bind(record.filename)
    .bind(record.face_part.as_str())
    .bind(record.severity)
    .bind(record.confidence)
    .bind(record.acne_count as i64)
    .bind(record.upload_time)
    .execute(pool)
    .await?;
    Ok(())
}
