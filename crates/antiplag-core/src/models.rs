//! Core data models used throughout antiplag.
//!
//! A [`DocumentRecord`] is one row of the metadata catalog; an
//! [`AnalysisRecord`] is the memoized analysis of one document.

use serde::{Deserialize, Serialize};

/// Catalog-assigned document identifier.
pub type DocumentId = i64;

/// A row of the metadata catalog.
///
/// Created on first upload of a distinct content, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub id: DocumentId,
    /// Original display name as uploaded.
    pub name: String,
    /// Hex SHA-256 of the full content.
    pub hash: String,
    /// Content length in bytes.
    pub size: i64,
    /// Locator resolvable by the blob store that wrote it.
    pub location: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Catalog insert payload; the catalog assigns `id`.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub name: String,
    pub hash: String,
    pub size: i64,
    pub location: String,
}

/// Content plus the record it was read through.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub record: DocumentRecord,
    pub content: Vec<u8>,
}

/// Result of a store call.
#[derive(Debug, Clone)]
pub struct StoreOutcome {
    pub record: DocumentRecord,
    /// `false` when the content was already stored under `record.id`.
    pub created: bool,
}

/// Paragraph, word and character counts for a text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStats {
    pub paragraph_count: u64,
    pub word_count: u64,
    pub character_count: u64,
}

/// Memoized analysis of one document. At most one exists per `file_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub file_id: DocumentId,
    #[serde(flatten)]
    pub stats: TextStats,
    /// Another document with byte-identical content, never `file_id` itself.
    pub plagiarism_file_id: Option<DocumentId>,
    /// File name of the rendered word cloud under the artifact directory.
    pub word_cloud_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_record_wire_shape() {
        let record = AnalysisRecord {
            file_id: 1,
            stats: TextStats {
                paragraph_count: 1,
                word_count: 2,
                character_count: 10,
            },
            plagiarism_file_id: None,
            word_cloud_path: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["paragraphCount"], 1);
        assert_eq!(json["wordCount"], 2);
        assert_eq!(json["characterCount"], 10);
        assert!(json["plagiarismFileId"].is_null());
        assert!(json["wordCloudPath"].is_null());
    }
}
