//! In-memory store implementations for testing.
//!
//! Uses `Vec` and `HashMap` behind `std::sync::RwLock`. Semantics match the
//! SQLite backends: ids start at 1 and increase, hash lookups return rows
//! in id order, and the analysis cache keeps the first record per document.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AnalysisRecord, DocumentId, DocumentRecord, NewDocument};

use super::{AnalysisCache, BlobStore, Catalog};

/// In-memory metadata catalog.
#[derive(Default)]
pub struct InMemoryCatalog {
    rows: RwLock<Vec<DocumentRecord>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn insert(&self, doc: &NewDocument) -> Result<DocumentRecord> {
        let mut rows = self.rows.write().unwrap();
        let record = DocumentRecord {
            id: rows.len() as DocumentId + 1,
            name: doc.name.clone(),
            hash: doc.hash.clone(),
            size: doc.size,
            location: doc.location.clone(),
            created_at: chrono::Utc::now().timestamp_millis(),
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: DocumentId) -> Result<Option<DocumentRecord>> {
        let rows = self.rows.read().unwrap();
        Ok(rows.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Vec<DocumentRecord>> {
        let rows = self.rows.read().unwrap();
        Ok(rows.iter().filter(|r| r.hash == hash).cloned().collect())
    }
}

/// In-memory blob store. Locations look like `mem://<seq>_<name>`.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    seq: AtomicU64,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop a blob, simulating content lost from disk.
    pub fn remove(&self, location: &str) -> Option<Vec<u8>> {
        self.blobs.write().unwrap().remove(location)
    }

    /// Place bytes at an exact location, bypassing name generation.
    pub fn put(&self, location: &str, data: &[u8]) {
        self.blobs
            .write()
            .unwrap()
            .insert(location.to_string(), data.to_vec());
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn write(&self, name: &str, data: &[u8]) -> Result<String> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let location = format!("mem://{}_{}", seq, name);
        self.put(&location, data);
        Ok(location)
    }

    async fn read(&self, location: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().unwrap().get(location).cloned())
    }
}

/// In-memory analysis cache with first-writer-wins inserts.
#[derive(Default)]
pub struct InMemoryAnalysisCache {
    records: RwLock<HashMap<DocumentId, AnalysisRecord>>,
}

impl InMemoryAnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AnalysisCache for InMemoryAnalysisCache {
    async fn get(&self, file_id: DocumentId) -> Result<Option<AnalysisRecord>> {
        Ok(self.records.read().unwrap().get(&file_id).cloned())
    }

    async fn insert(&self, record: &AnalysisRecord) -> Result<AnalysisRecord> {
        let mut records = self.records.write().unwrap();
        let stored = records
            .entry(record.file_id)
            .or_insert_with(|| record.clone());
        Ok(stored.clone())
    }
}
