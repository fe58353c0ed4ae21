//! SQLite-backed [`Catalog`] and [`AnalysisCache`].
//!
//! Both wrap a shared [`SqlitePool`]. Tables are created by
//! [`migrate::apply`](crate::migrate::apply).

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use antiplag_core::store::{AnalysisCache, Catalog};
use antiplag_core::{
    AnalysisRecord, DocumentId, DocumentRecord, Error, NewDocument, Result, TextStats,
};

/// SQLite implementation of [`Catalog`] over the `file_metadata` table.
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn document_from_row(row: &SqliteRow) -> DocumentRecord {
    DocumentRecord {
        id: row.get("id"),
        name: row.get("name"),
        hash: row.get("hash"),
        size: row.get("size"),
        location: row.get("location"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn insert(&self, doc: &NewDocument) -> Result<DocumentRecord> {
        let created_at = chrono::Utc::now().timestamp_millis();
        let id = sqlx::query(
            "INSERT INTO file_metadata (name, hash, size, location, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&doc.name)
        .bind(&doc.hash)
        .bind(doc.size)
        .bind(&doc.location)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::storage)?
        .last_insert_rowid();

        Ok(DocumentRecord {
            id,
            name: doc.name.clone(),
            hash: doc.hash.clone(),
            size: doc.size,
            location: doc.location.clone(),
            created_at,
        })
    }

    async fn get(&self, id: DocumentId) -> Result<Option<DocumentRecord>> {
        let row = sqlx::query(
            "SELECT id, name, hash, size, location, created_at FROM file_metadata WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::storage)?;

        Ok(row.as_ref().map(document_from_row))
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Vec<DocumentRecord>> {
        let rows = sqlx::query(
            "SELECT id, name, hash, size, location, created_at FROM file_metadata WHERE hash = ? ORDER BY id ASC",
        )
        .bind(hash)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::storage)?;

        Ok(rows.iter().map(document_from_row).collect())
    }
}

/// SQLite implementation of [`AnalysisCache`] over `analysis_metadata`.
///
/// The unique index on `file_id` decides concurrent first analyses: the
/// losing insert is ignored and the winner's row is read back.
#[derive(Clone)]
pub struct SqliteAnalysisCache {
    pool: SqlitePool,
}

impl SqliteAnalysisCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn analysis_from_row(row: &SqliteRow) -> AnalysisRecord {
    let paragraph_count: i64 = row.get("paragraph_count");
    let word_count: i64 = row.get("word_count");
    let character_count: i64 = row.get("character_count");
    AnalysisRecord {
        file_id: row.get("file_id"),
        stats: TextStats {
            paragraph_count: paragraph_count as u64,
            word_count: word_count as u64,
            character_count: character_count as u64,
        },
        plagiarism_file_id: row.get("plagiarism_file_id"),
        word_cloud_path: row.get("word_cloud_path"),
    }
}

#[async_trait]
impl AnalysisCache for SqliteAnalysisCache {
    async fn get(&self, file_id: DocumentId) -> Result<Option<AnalysisRecord>> {
        let row = sqlx::query(
            r#"
            SELECT file_id, paragraph_count, word_count, character_count,
                   plagiarism_file_id, word_cloud_path
            FROM analysis_metadata WHERE file_id = ?
            "#,
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::storage)?;

        Ok(row.as_ref().map(analysis_from_row))
    }

    async fn insert(&self, record: &AnalysisRecord) -> Result<AnalysisRecord> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO analysis_metadata (file_id, paragraph_count, word_count, character_count,
                                           plagiarism_file_id, word_cloud_path, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(file_id) DO NOTHING
            "#,
        )
        .bind(record.file_id)
        .bind(record.stats.paragraph_count as i64)
        .bind(record.stats.word_count as i64)
        .bind(record.stats.character_count as i64)
        .bind(record.plagiarism_file_id)
        .bind(&record.word_cloud_path)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(Error::storage)?
        .rows_affected();

        if inserted == 1 {
            return Ok(record.clone());
        }

        debug!(file_id = record.file_id, "analysis already stored, reading winner");
        self.get(record.file_id).await?.ok_or_else(|| {
            Error::Storage(format!(
                "analysis for file {} conflicted but could not be read back",
                record.file_id
            ))
        })
    }
}
