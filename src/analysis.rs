//! Analysis pipeline with a persistent cache.
//!
//! `analyze(id)` returns the cached [`AnalysisRecord`] when one exists.
//! Otherwise it fetches the content, computes [`TextStats`] line by line,
//! asks for a byte-identical duplicate, renders a word cloud, and stores the
//! result. Records are never recomputed once stored.
//!
//! Required steps (content fetch, persistence) fail the call. The duplicate
//! query and word-cloud rendering are best-effort: their failures leave the
//! corresponding field empty.
//!
//! There is no in-process lock per document. Concurrent first analyses of
//! the same id both compute; the cache keeps the first insert, the other
//! caller discards its own result and returns the stored one.
//!
//! [`TextStats`]: antiplag_core::TextStats

use std::sync::Arc;

use tracing::{error, info, warn};

use antiplag_core::source::{ContentSource, DuplicateSource};
use antiplag_core::stats::compute_stats;
use antiplag_core::store::AnalysisCache;
use antiplag_core::{AnalysisRecord, DocumentId, Error, Outcome, Result};

use crate::wordcloud::WordCloudGenerator;

/// Everything one `analyze` call learned, including how the best-effort
/// steps went. Cache hits carry `Outcome::Ready` values read from the record.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub record: AnalysisRecord,
    /// `true` when the record came from the cache without recomputation.
    pub cached: bool,
    pub duplicate: Outcome<Option<DocumentId>>,
    pub word_cloud: Outcome<Option<String>>,
}

pub struct AnalysisEngine {
    cache: Arc<dyn AnalysisCache>,
    content: Arc<dyn ContentSource>,
    duplicates: Arc<dyn DuplicateSource>,
    wordclouds: WordCloudGenerator,
}

impl AnalysisEngine {
    pub fn new(
        cache: Arc<dyn AnalysisCache>,
        content: Arc<dyn ContentSource>,
        duplicates: Arc<dyn DuplicateSource>,
        wordclouds: WordCloudGenerator,
    ) -> Self {
        Self {
            cache,
            content,
            duplicates,
            wordclouds,
        }
    }

    pub fn wordclouds(&self) -> &WordCloudGenerator {
        &self.wordclouds
    }

    pub async fn analyze(&self, id: DocumentId) -> Result<AnalysisRecord> {
        Ok(self.analyze_detailed(id).await?.record)
    }

    pub async fn analyze_detailed(&self, id: DocumentId) -> Result<AnalysisReport> {
        if let Some(record) = self.cache.get(id).await? {
            info!(file_id = id, "analysis cache hit");
            return Ok(AnalysisReport {
                duplicate: Outcome::Ready(record.plagiarism_file_id),
                word_cloud: Outcome::Ready(record.word_cloud_path.clone()),
                record,
                cached: true,
            });
        }

        let content = self.content.fetch_content(id).await?;
        let stats = compute_stats(content.as_slice())?;

        let duplicate: Outcome<Option<DocumentId>> = self.duplicates.duplicate_of(id).await.into();
        if let Some(reason) = duplicate.reason() {
            warn!(file_id = id, %reason, "duplicate lookup failed, recording none");
        }

        let text = String::from_utf8_lossy(&content);
        let word_cloud = self.wordclouds.generate(&text).await;

        let record = AnalysisRecord {
            file_id: id,
            stats,
            plagiarism_file_id: duplicate.as_ready().copied().flatten(),
            word_cloud_path: word_cloud.as_ready().cloned(),
        };

        let stored = match self.cache.insert(&record).await {
            Ok(stored) => stored,
            Err(e) => {
                self.report_orphan(id, record.word_cloud_path.as_deref());
                error!(file_id = id, error = %e, "failed to persist analysis");
                return Err(match e {
                    Error::Storage(msg) => Error::Storage(msg),
                    other => Error::Storage(other.to_string()),
                });
            }
        };

        if stored != record {
            info!(file_id = id, "concurrent analysis stored first, discarding own result");
            if stored.word_cloud_path != record.word_cloud_path {
                self.report_orphan(id, record.word_cloud_path.as_deref());
            }
            return Ok(AnalysisReport {
                duplicate: Outcome::Ready(stored.plagiarism_file_id),
                word_cloud: Outcome::Ready(stored.word_cloud_path.clone()),
                record: stored,
                cached: true,
            });
        }

        info!(
            file_id = id,
            paragraphs = stored.stats.paragraph_count,
            words = stored.stats.word_count,
            characters = stored.stats.character_count,
            duplicate = ?stored.plagiarism_file_id,
            "analysis stored"
        );
        Ok(AnalysisReport {
            record: stored,
            cached: false,
            duplicate,
            word_cloud: match word_cloud {
                Outcome::Ready(name) => Outcome::Ready(Some(name)),
                Outcome::Degraded(reason) => Outcome::Degraded(reason),
            },
        })
    }

    /// Artifacts written for a record that was never stored are not cleaned
    /// up here; they are logged for external collection.
    fn report_orphan(&self, id: DocumentId, artifact: Option<&str>) {
        if let Some(name) = artifact {
            let path = self.wordclouds.dir().join(name);
            warn!(file_id = id, path = %path.display(), "orphaned word cloud artifact");
        }
    }
}
