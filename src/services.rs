//! Wires the engines from configuration.
//!
//! Every component receives its settings here, at construction; nothing
//! reads configuration at call time.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

use antiplag_core::source::{ContentSource, DuplicateSource};

use crate::analysis::AnalysisEngine;
use crate::blob::FsBlobStore;
use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::remote::RemoteStorage;
use crate::sqlite_store::{SqliteAnalysisCache, SqliteCatalog};
use crate::storage::StorageEngine;
use crate::wordcloud::{create_renderer, WordCloudGenerator};

pub struct Services {
    pub pool: SqlitePool,
    pub storage: Arc<StorageEngine>,
    pub analysis: Arc<AnalysisEngine>,
}

impl Services {
    /// Open the database (creating tables if needed) and build both engines.
    pub async fn build(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::apply(&pool).await?;

        let storage = Arc::new(StorageEngine::new(
            Arc::new(SqliteCatalog::new(pool.clone())),
            Arc::new(FsBlobStore::new(&config.storage.upload_dir)),
        ));

        let (content, duplicates): (Arc<dyn ContentSource>, Arc<dyn DuplicateSource>) =
            match &config.analysis.storage_url {
                Some(url) => {
                    info!(%url, "analysis reads from remote storage");
                    let remote = Arc::new(RemoteStorage::new(
                        url,
                        Duration::from_secs(config.analysis.storage_timeout_secs),
                    )?);
                    (remote.clone(), remote)
                }
                None => (storage.clone(), storage.clone()),
            };

        let wordclouds = WordCloudGenerator::new(
            create_renderer(&config.wordcloud)?,
            &config.analysis.wordcloud_dir,
        );

        let analysis = Arc::new(AnalysisEngine::new(
            Arc::new(SqliteAnalysisCache::new(pool.clone())),
            content,
            duplicates,
            wordclouds,
        ));

        Ok(Self {
            pool,
            storage,
            analysis,
        })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
