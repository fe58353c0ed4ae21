//! Storage abstraction for antiplag.
//!
//! Three traits split persistence along the lines the engines need:
//!
//! | Trait | Holds | Native backend |
//! |-------|-------|----------------|
//! | [`Catalog`] | document metadata rows | SQLite `file_metadata` |
//! | [`BlobStore`] | raw uploaded bytes | upload directory |
//! | [`AnalysisCache`] | memoized analyses | SQLite `analysis_metadata` |
//!
//! Implementations must be `Send + Sync` to be shared across request tasks.
//! None of them lock at the engine level; concurrency control is whatever
//! the backend provides.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AnalysisRecord, DocumentId, DocumentRecord, NewDocument};

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Insert a row and return it with its assigned id.
    async fn insert(&self, doc: &NewDocument) -> Result<DocumentRecord>;

    async fn get(&self, id: DocumentId) -> Result<Option<DocumentRecord>>;

    /// All rows sharing `hash`, ascending by id.
    async fn find_by_hash(&self, hash: &str) -> Result<Vec<DocumentRecord>>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` under a new, unique location derived from `name`.
    ///
    /// Never overwrites an existing blob. Returns the location.
    async fn write(&self, name: &str, data: &[u8]) -> Result<String>;

    /// Read a blob. `Ok(None)` when nothing exists at `location`.
    async fn read(&self, location: &str) -> Result<Option<Vec<u8>>>;
}

#[async_trait]
pub trait AnalysisCache: Send + Sync {
    async fn get(&self, file_id: DocumentId) -> Result<Option<AnalysisRecord>>;

    /// Persist `record` unless one already exists for its `file_id`.
    ///
    /// Returns the record that is stored after the call: `record` itself,
    /// or the earlier writer's record when another insert won.
    async fn insert(&self, record: &AnalysisRecord) -> Result<AnalysisRecord>;
}
