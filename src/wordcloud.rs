//! Word-cloud rendering.
//!
//! A [`WordCloudRenderer`] turns text into image bytes; the
//! [`WordCloudGenerator`] calls it and writes the image as
//! `<epoch-millis>.png` under the artifact directory.
//!
//! Rendering is cosmetic. Every failure (provider disabled, blank text,
//! transport error, timeout, error status, empty body, file write) comes
//! back as [`Outcome::Degraded`] and is logged, never raised.
//!
//! # Providers
//!
//! - **`quickchart`**: [`QuickChartRenderer`] POSTs
//!   `{format, width, height, fontScale, scale, text}` to the configured
//!   URL with a bounded timeout.
//! - **`disabled`**: [`DisabledRenderer`] always fails.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use antiplag_core::Outcome;

use crate::blob::write_unique;
use crate::config::WordCloudConfig;

#[async_trait]
pub trait WordCloudRenderer: Send + Sync {
    /// Provider identifier, for logs.
    fn name(&self) -> &str;

    /// Render `text` to image bytes. An empty vector means "no image".
    async fn render(&self, text: &str) -> Result<Vec<u8>>;
}

/// Build the renderer selected by `wordcloud.provider`.
pub fn create_renderer(config: &WordCloudConfig) -> Result<Arc<dyn WordCloudRenderer>> {
    match config.provider.as_str() {
        "quickchart" => Ok(Arc::new(QuickChartRenderer::new(config)?)),
        "disabled" => Ok(Arc::new(DisabledRenderer)),
        other => bail!("Unknown wordcloud provider: {}", other),
    }
}

// ============ Disabled Renderer ============

pub struct DisabledRenderer;

#[async_trait]
impl WordCloudRenderer for DisabledRenderer {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn render(&self, _text: &str) -> Result<Vec<u8>> {
        bail!("word cloud rendering is disabled")
    }
}

// ============ QuickChart Renderer ============

/// Renderer backed by a QuickChart-compatible `/wordcloud` endpoint.
pub struct QuickChartRenderer {
    client: reqwest::Client,
    url: String,
    width: u32,
    height: u32,
    font_scale: u32,
}

impl QuickChartRenderer {
    pub fn new(config: &WordCloudConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            width: config.width,
            height: config.height,
            font_scale: config.font_scale,
        })
    }

    fn payload(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "format": "png",
            "width": self.width,
            "height": self.height,
            "fontScale": self.font_scale,
            "scale": "linear",
            "text": text,
        })
    }
}

#[async_trait]
impl WordCloudRenderer for QuickChartRenderer {
    fn name(&self) -> &str {
        "quickchart"
    }

    async fn render(&self, text: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .post(&self.url)
            .json(&self.payload(text))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("renderer returned {}: {}", status, body.trim());
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

// ============ Generator ============

/// Renders word clouds and stores them as PNG artifacts.
pub struct WordCloudGenerator {
    renderer: Arc<dyn WordCloudRenderer>,
    dir: PathBuf,
}

impl WordCloudGenerator {
    pub fn new(renderer: Arc<dyn WordCloudRenderer>, dir: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Render `text` and return the artifact's file name.
    pub async fn generate(&self, text: &str) -> Outcome<String> {
        if text.trim().is_empty() {
            warn!("empty text, skipping word cloud");
            return Outcome::degraded("empty text");
        }

        let image = match self.renderer.render(text).await {
            Ok(image) => image,
            Err(e) => {
                warn!(renderer = self.renderer.name(), error = %e, "word cloud rendering failed");
                return Outcome::degraded(e.to_string());
            }
        };
        if image.is_empty() {
            warn!(renderer = self.renderer.name(), "renderer returned an empty image");
            return Outcome::degraded("empty response from renderer");
        }

        match write_unique(&self.dir, |millis| format!("{}.png", millis), &image).await {
            Ok(path) => {
                info!(path = %path.display(), "word cloud saved");
                match path.file_name() {
                    Some(name) => Outcome::Ready(name.to_string_lossy().into_owned()),
                    None => Outcome::degraded("artifact path has no file name"),
                }
            }
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "could not save word cloud");
                Outcome::degraded(format!("saving word cloud: {}", e))
            }
        }
    }
}
