//! Catalog and cache statistics.
//!
//! Summarizes what is stored and analyzed: document count, distinct
//! contents, analysis coverage, and how many analyses found a duplicate or
//! produced a word cloud. Used by `antiplag stats`.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;
use crate::migrate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStats {
    pub documents: i64,
    pub distinct_hashes: i64,
    pub stored_bytes: i64,
    pub analyses: i64,
    pub with_duplicate: i64,
    pub with_word_cloud: i64,
    /// Epoch millis of the newest upload.
    pub last_upload_ms: Option<i64>,
}

pub async fn collect_stats(pool: &SqlitePool) -> Result<CatalogStats> {
    let (documents, distinct_hashes, stored_bytes, last_upload_ms): (i64, i64, i64, Option<i64>) =
        sqlx::query_as(
            "SELECT COUNT(*), COUNT(DISTINCT hash), COALESCE(SUM(size), 0), MAX(created_at) FROM file_metadata",
        )
        .fetch_one(pool)
        .await?;

    let (analyses, with_duplicate, with_word_cloud): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COUNT(plagiarism_file_id),
            COUNT(word_cloud_path)
        FROM analysis_metadata
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(CatalogStats {
        documents,
        distinct_hashes,
        stored_bytes,
        analyses,
        with_duplicate,
        with_word_cloud,
        last_upload_ms,
    })
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;
    let stats = collect_stats(&pool).await?;
    pool.close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("antiplag: database stats");
    println!("========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Documents:   {}", stats.documents);
    println!("  Distinct:    {}", stats.distinct_hashes);
    println!("  Stored:      {}", format_bytes(stats.stored_bytes.max(0) as u64));
    println!(
        "  Last upload: {}",
        stats
            .last_upload_ms
            .map(format_ts_relative)
            .unwrap_or_else(|| "never".to_string())
    );
    println!();
    println!(
        "  Analyses:    {} / {} ({}%)",
        stats.analyses,
        stats.documents,
        if stats.documents > 0 {
            (stats.analyses * 100) / stats.documents
        } else {
            0
        }
    );
    println!("  Duplicates:  {}", stats.with_duplicate);
    println!("  Word clouds: {}", stats.with_word_cloud);
    println!();

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format an epoch-millis timestamp relative to now (e.g. "3 hours ago").
fn format_ts_relative(ts_ms: i64) -> String {
    let delta = (chrono::Utc::now().timestamp_millis() - ts_ms) / 1000;

    if delta < 0 {
        format_ts_iso(ts_ms)
    } else if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts_ms)
    }
}

fn format_ts_iso(ts_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts_ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite_store::{SqliteAnalysisCache, SqliteCatalog};
    use antiplag_core::store::{AnalysisCache, Catalog};
    use antiplag_core::{AnalysisRecord, NewDocument, TextStats};
    use tempfile::TempDir;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_format_ts_relative() {
        let now = chrono::Utc::now().timestamp_millis();
        assert_eq!(format_ts_relative(now), "just now");
        assert_eq!(format_ts_relative(now - 2 * 3600 * 1000), "2 hours ago");
        assert_eq!(format_ts_relative(0), "1970-01-01 00:00");
    }

    #[tokio::test]
    async fn test_collect_stats() {
        let tmp = TempDir::new().unwrap();
        let config = crate::config::parse_config(&format!(
            "[db]\npath = \"{}\"\n\n[storage]\nupload_dir = \"{}\"\n",
            tmp.path().join("stats.sqlite").display(),
            tmp.path().join("uploads").display()
        ))
        .unwrap();
        let pool = db::connect(&config).await.unwrap();
        migrate::apply(&pool).await.unwrap();

        let empty = collect_stats(&pool).await.unwrap();
        assert_eq!(empty.documents, 0);
        assert_eq!(empty.last_upload_ms, None);

        let catalog = SqliteCatalog::new(pool.clone());
        for (name, hash, size) in [("a.txt", "h1", 3), ("b.txt", "h1", 3), ("c.txt", "h2", 5)] {
            catalog
                .insert(&NewDocument {
                    name: name.to_string(),
                    hash: hash.to_string(),
                    size,
                    location: format!("/tmp/{}", name),
                })
                .await
                .unwrap();
        }
        SqliteAnalysisCache::new(pool.clone())
            .insert(&AnalysisRecord {
                file_id: 2,
                stats: TextStats {
                    paragraph_count: 1,
                    word_count: 1,
                    character_count: 3,
                },
                plagiarism_file_id: Some(1),
                word_cloud_path: None,
            })
            .await
            .unwrap();

        let stats = collect_stats(&pool).await.unwrap();
        assert_eq!(stats.documents, 3);
        assert_eq!(stats.distinct_hashes, 2);
        assert_eq!(stats.stored_bytes, 11);
        assert_eq!(stats.analyses, 1);
        assert_eq!(stats.with_duplicate, 1);
        assert_eq!(stats.with_word_cloud, 0);
        assert!(stats.last_upload_ms.is_some());
    }
}
