//! Filesystem blob store.
//!
//! Each upload becomes one file named `<epoch-millis>_<original-name>` in
//! the upload directory. Files are created with `create_new`, so a writer
//! never replaces an existing blob: on a name clash the timestamp is bumped
//! and the create is retried.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use antiplag_core::store::BlobStore;
use antiplag_core::{Error, Result};

/// Upper bound on timestamp bumps before a write gives up.
const MAX_NAME_ATTEMPTS: i64 = 64;

pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Reduce an uploaded name to a single path component.
pub fn sanitize_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match base {
        "" | "." | ".." => "upload".to_string(),
        other => other.to_string(),
    }
}

/// Create a new file in `dir` and write `data` to it.
///
/// `make_name` maps an epoch-millis timestamp to a file name. Existing files
/// are never touched; a clash retries with the next millisecond. A file whose
/// write fails part-way is removed before the error is returned.
pub(crate) async fn write_unique<F>(dir: &Path, make_name: F, data: &[u8]) -> std::io::Result<PathBuf>
where
    F: Fn(i64) -> String,
{
    fs::create_dir_all(dir).await?;
    let start = chrono::Utc::now().timestamp_millis();

    for bump in 0..MAX_NAME_ATTEMPTS {
        let path = dir.join(make_name(start + bump));
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        };

        let written = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            warn!(path = %path.display(), error = %e, "write failed, removing partial file");
            let _ = fs::remove_file(&path).await;
            return Err(e);
        }
        return Ok(path);
    }

    Err(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free file name in {} after {} attempts", dir.display(), MAX_NAME_ATTEMPTS),
    ))
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn write(&self, name: &str, data: &[u8]) -> Result<String> {
        let name = sanitize_name(name);
        let path = write_unique(&self.root, |millis| format!("{}_{}", millis, name), data)
            .await
            .map_err(|e| Error::Storage(format!("blob write in {}: {}", self.root.display(), e)))?;

        debug!(path = %path.display(), size = data.len(), "blob written");
        Ok(path.to_string_lossy().into_owned())
    }

    async fn read(&self, location: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(location).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!("blob read {}: {}", location, e))),
        }
    }
}
