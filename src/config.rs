use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub wordcloud: WordCloudConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding uploaded blobs, one file per distinct content.
    pub upload_dir: PathBuf,
    /// Uploads must end in `.<accepted_extension>` (case-insensitive).
    #[serde(default = "default_accepted_extension")]
    pub accepted_extension: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_accepted_extension() -> String {
    "txt".to_string()
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default = "default_wordcloud_dir")]
    pub wordcloud_dir: PathBuf,
    /// Base URL of a remote storage service. When unset, analysis reads
    /// content and duplicates from the in-process storage engine.
    #[serde(default)]
    pub storage_url: Option<String>,
    #[serde(default = "default_storage_timeout_secs")]
    pub storage_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            wordcloud_dir: default_wordcloud_dir(),
            storage_url: None,
            storage_timeout_secs: default_storage_timeout_secs(),
        }
    }
}

fn default_wordcloud_dir() -> PathBuf {
    PathBuf::from("wordclouds")
}
fn default_storage_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct WordCloudConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_wordcloud_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_dimension")]
    pub width: u32,
    #[serde(default = "default_dimension")]
    pub height: u32,
    #[serde(default = "default_font_scale")]
    pub font_scale: u32,
}

impl Default for WordCloudConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            url: default_wordcloud_url(),
            timeout_secs: default_timeout_secs(),
            width: default_dimension(),
            height: default_dimension(),
            font_scale: default_font_scale(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_wordcloud_url() -> String {
    "https://quickchart.io/wordcloud".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_dimension() -> u32 {
    1000
}
fn default_font_scale() -> u32 {
    15
}

impl WordCloudConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content)?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let ext = config.storage.accepted_extension.trim_start_matches('.');
    if ext.is_empty() {
        anyhow::bail!("storage.accepted_extension must not be empty");
    }
    if config.storage.max_upload_bytes == 0 {
        anyhow::bail!("storage.max_upload_bytes must be > 0");
    }

    if let Some(url) = &config.analysis.storage_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!(
                "analysis.storage_url must be an http(s) URL, got '{}'",
                url
            );
        }
    }
    if config.analysis.storage_timeout_secs == 0 {
        anyhow::bail!("analysis.storage_timeout_secs must be > 0");
    }

    let wc = &config.wordcloud;
    if wc.timeout_secs == 0 {
        anyhow::bail!("wordcloud.timeout_secs must be > 0");
    }
    if wc.width == 0 || wc.height == 0 {
        anyhow::bail!("wordcloud.width and wordcloud.height must be > 0");
    }

    match wc.provider.as_str() {
        "disabled" | "quickchart" => {}
        other => anyhow::bail!(
            "Unknown wordcloud provider: '{}'. Must be disabled or quickchart.",
            other
        ),
    }

    Ok(())
}
