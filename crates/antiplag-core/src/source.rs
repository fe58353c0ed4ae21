//! Seams between the analysis engine and the storage side.
//!
//! The analysis engine never talks to the catalog directly. It reads
//! content and asks for duplicates through these traits, implemented
//! in-process by the storage engine and over HTTP by the remote client.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::DocumentId;

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Raw bytes of a stored document.
    ///
    /// Fails with [`Error::NotFound`](crate::Error::NotFound) for an
    /// unknown id.
    async fn fetch_content(&self, id: DocumentId) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait DuplicateSource: Send + Sync {
    /// Id of another document with byte-identical content, if any.
    async fn duplicate_of(&self, id: DocumentId) -> Result<Option<DocumentId>>;
}
