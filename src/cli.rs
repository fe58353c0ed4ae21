//! Command implementations for the `antiplag` binary.
//!
//! Each command builds the in-process engines from the config, runs one
//! operation, and prints the result to stdout. Engine errors propagate, so
//! an unknown id ends the process non-zero with the error on stderr.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use antiplag_core::{DocumentId, Outcome};

use crate::config::Config;
use crate::services::Services;
use crate::storage::validate_upload;

/// Store a local file. `name` overrides the file name recorded in the
/// catalog (and checked against the accepted extension).
pub async fn run_upload(config: &Config, path: &Path, name: Option<&str>) -> Result<()> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = match name {
        Some(name) => name.to_string(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    validate_upload(&name, &content, &config.storage.accepted_extension)?;

    let services = Services::build(config).await?;
    let result = services.storage.store(&content, &name).await;
    services.close().await;
    let outcome = result?;

    println!("id: {}", outcome.record.id);
    println!(
        "status: {}",
        if outcome.created { "new" } else { "existing" }
    );
    Ok(())
}

/// Write the stored bytes of `id` to stdout, unmodified.
pub async fn run_get(config: &Config, id: DocumentId) -> Result<()> {
    let services = Services::build(config).await?;
    let result = services.storage.fetch(id).await;
    services.close().await;
    let file = result?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&file.content)?;
    stdout.flush()?;
    Ok(())
}

pub async fn run_duplicate(config: &Config, id: DocumentId) -> Result<()> {
    let services = Services::build(config).await?;
    let result = services.storage.find_duplicate(id).await;
    services.close().await;

    match result? {
        Some(record) => println!("duplicate: {}", record.id),
        None => println!("duplicate: none"),
    }
    Ok(())
}

/// Analyze `id` (or read its cached analysis) and print the record.
///
/// With `json`, prints the record in the HTTP response shape instead.
pub async fn run_analyze(config: &Config, id: DocumentId, json: bool) -> Result<()> {
    let services = Services::build(config).await?;
    let result = services.analysis.analyze_detailed(id).await;
    services.close().await;
    let report = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.record)?);
        return Ok(());
    }

    let record = &report.record;
    println!("file_id:     {}", record.file_id);
    println!("paragraphs:  {}", record.stats.paragraph_count);
    println!("words:       {}", record.stats.word_count);
    println!("characters:  {}", record.stats.character_count);
    println!(
        "duplicate:   {}",
        describe(&report.duplicate, |d| d.map(|id| id.to_string()))
    );
    println!(
        "word_cloud:  {}",
        describe(&report.word_cloud, |w| w.clone())
    );
    println!("cached:      {}", if report.cached { "yes" } else { "no" });
    Ok(())
}

fn describe<T>(outcome: &Outcome<T>, show: impl Fn(&T) -> Option<String>) -> String {
    match outcome {
        Outcome::Ready(value) => show(value).unwrap_or_else(|| "none".to_string()),
        Outcome::Degraded(reason) => format!("none ({})", reason),
    }
}
