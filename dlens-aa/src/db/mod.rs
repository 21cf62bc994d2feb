//! Database access for dlens-aa
//!
//! One SQLite database in the root folder holds the user-folder registry and
//! the append-only analysis history. The per-batch snapshot lives on disk
//! (see `storage`), not here.

pub mod analyses;
pub mod folders;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create dlens-aa tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_folders (
            username TEXT PRIMARY KEY,
            folder_path TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Append-only history: one row per region per batch. Snapshot overwrites
    // never touch this table.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS acne_analysis (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            filename TEXT NOT NULL,
            face_part TEXT NOT NULL,
            severity TEXT NOT NULL,
            confidence REAL NOT NULL,
            acne_count INTEGER NOT NULL,
            upload_time TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (user_folders, acne_analysis)");

    Ok(())
}
