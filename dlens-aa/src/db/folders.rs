//! User folder registry

use dlens_common::Result;
use sqlx::SqlitePool;

/// True if the user has ever completed a registration or upload
pub async fn user_exists(pool: &SqlitePool, username: &str) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM user_folders WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Register the user's folder, inserting only on first sight
pub async fn ensure_user_folder(
    pool: &SqlitePool,
    username: &str,
    folder_path: &str,
) -> Result<()> {
    if user_exists(pool, username).await? {
        return Ok(());
    }
    sqlx::query("INSERT INTO user_folders (username, folder_path) VALUES (?, ?)")
        .bind(username)
        .bind(folder_path)
        .execute(pool)
        .await?;
    tracing::debug!(username, "User folder registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("in-memory database");
        crate::db::init_tables(&pool).await.expect("init tables");
        pool
    }

    #[tokio::test]
    async fn ensure_user_folder_is_idempotent() {
        let pool = test_pool().await;

        assert!(!user_exists(&pool, "alice").await.unwrap());

        ensure_user_folder(&pool, "alice", "/uploads/alice")
            .await
            .unwrap();
        ensure_user_folder(&pool, "alice", "/uploads/alice")
            .await
            .unwrap();

        assert!(user_exists(&pool, "alice").await.unwrap());

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_folders")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }
}
