//! Content-addressed storage engine.
//!
//! Orchestrates a [`Catalog`] and a [`BlobStore`]. Incoming content is
//! hashed, candidates sharing the hash are compared byte for byte, and only
//! content with no equal candidate is written. Identical bytes therefore map
//! to one document id and one physical copy.
//!
//! The dedup lookup and the insert are not serialized. Two concurrent
//! uploads of the same new content can both miss the lookup and both be
//! stored; later uploads and duplicate queries then resolve to the lower id.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use antiplag_core::hash::content_hash;
use antiplag_core::models::StoreOutcome;
use antiplag_core::source::{ContentSource, DuplicateSource};
use antiplag_core::store::{BlobStore, Catalog};
use antiplag_core::{DocumentId, DocumentRecord, Error, NewDocument, Result, StoredFile};

pub struct StorageEngine {
    catalog: Arc<dyn Catalog>,
    blobs: Arc<dyn BlobStore>,
}

impl StorageEngine {
    pub fn new(catalog: Arc<dyn Catalog>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { catalog, blobs }
    }

    /// Store `content` under `name`, or return the id it is already stored
    /// under.
    ///
    /// Upload policy (non-empty, accepted extension) is checked by the caller
    /// with [`validate_upload`].
    pub async fn store(&self, content: &[u8], name: &str) -> Result<StoreOutcome> {
        let hash = content_hash(content);

        if let Some(existing) = self.find_equal(&hash, content, None).await? {
            info!(file_id = existing.id, %hash, "content already stored");
            return Ok(StoreOutcome {
                record: existing,
                created: false,
            });
        }

        let location = self.blobs.write(name, content).await?;
        let new_doc = NewDocument {
            name: name.to_string(),
            hash,
            size: content.len() as i64,
            location,
        };
        let record = match self.catalog.insert(&new_doc).await {
            Ok(record) => record,
            Err(e) => {
                warn!(location = %new_doc.location, error = %e, "catalog insert failed, blob left uncommitted");
                return Err(e);
            }
        };

        info!(file_id = record.id, name = %record.name, size = record.size, "stored new content");
        Ok(StoreOutcome {
            record,
            created: true,
        })
    }

    /// Content and metadata of a stored document.
    ///
    /// `NotFound` when the id is unknown, `BlobMissing` when the catalog row
    /// exists but its blob does not.
    pub async fn fetch(&self, id: DocumentId) -> Result<StoredFile> {
        let record = self.catalog.get(id).await?.ok_or(Error::NotFound(id))?;

        match self.blobs.read(&record.location).await? {
            Some(content) => Ok(StoredFile { record, content }),
            None => {
                warn!(file_id = id, location = %record.location, "catalog row has no blob");
                Err(Error::BlobMissing {
                    id,
                    location: record.location,
                })
            }
        }
    }

    /// First other document whose bytes equal those of `id`.
    ///
    /// Exact equality only; similar documents are not duplicates.
    pub async fn find_duplicate(&self, id: DocumentId) -> Result<Option<DocumentRecord>> {
        let file = self.fetch(id).await?;
        self.find_equal(&file.record.hash, &file.content, Some(id))
            .await
    }

    /// Walk the hash candidates in catalog order and return the first whose
    /// stored bytes equal `content`.
    async fn find_equal(
        &self,
        hash: &str,
        content: &[u8],
        exclude: Option<DocumentId>,
    ) -> Result<Option<DocumentRecord>> {
        for candidate in self.catalog.find_by_hash(hash).await? {
            if Some(candidate.id) == exclude {
                continue;
            }
            if candidate.size != content.len() as i64 {
                debug!(file_id = candidate.id, %hash, "hash match with different size");
                continue;
            }
            match self.blobs.read(&candidate.location).await {
                Ok(Some(bytes)) if bytes == content => return Ok(Some(candidate)),
                Ok(Some(_)) => {
                    warn!(file_id = candidate.id, %hash, "hash collision with different content");
                }
                Ok(None) => {
                    warn!(file_id = candidate.id, location = %candidate.location, "candidate blob missing, skipped");
                }
                Err(e) => {
                    warn!(file_id = candidate.id, error = %e, "candidate blob unreadable, skipped");
                }
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl ContentSource for StorageEngine {
    async fn fetch_content(&self, id: DocumentId) -> Result<Vec<u8>> {
        Ok(self.fetch(id).await?.content)
    }
}

#[async_trait]
impl DuplicateSource for StorageEngine {
    async fn duplicate_of(&self, id: DocumentId) -> Result<Option<DocumentId>> {
        Ok(self.find_duplicate(id).await?.map(|r| r.id))
    }
}

/// Boundary policy for uploads: content must be non-empty and the name's
/// last `.`-separated part must equal `accepted_extension`, ignoring case.
pub fn validate_upload(name: &str, content: &[u8], accepted_extension: &str) -> Result<()> {
    if content.is_empty() {
        return Err(Error::InvalidInput("file is empty".to_string()));
    }

    let wanted = accepted_extension.trim_start_matches('.').to_lowercase();
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if extension != wanted {
        return Err(Error::InvalidInput(format!(
            "'{}' is not a .{} file",
            name, wanted
        )));
    }

    Ok(())
}
