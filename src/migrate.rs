use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

use crate::config::Config;
use crate::db;

/// Create the database and both tables. Safe to run repeatedly.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;

    std::fs::create_dir_all(&config.storage.upload_dir)?;
    std::fs::create_dir_all(&config.analysis.wordcloud_dir)?;

    info!(db = %config.db.path.display(), "schema up to date");
    Ok(())
}

pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // Metadata catalog. `hash` is a lookup key, not unique: distinct
    // contents may share a hash.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS file_metadata (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            hash TEXT NOT NULL,
            size INTEGER NOT NULL,
            location TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Analysis cache, at most one row per document.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analysis_metadata (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_id INTEGER NOT NULL UNIQUE,
            paragraph_count INTEGER NOT NULL,
            word_count INTEGER NOT NULL,
            character_count INTEGER NOT NULL,
            plagiarism_file_id INTEGER,
            word_cloud_path TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_file_metadata_hash ON file_metadata(hash)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_analysis_metadata_file_id ON analysis_metadata(file_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
