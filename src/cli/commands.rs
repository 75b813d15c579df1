//! Command implementations

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::adapters::{AppConfig, TomlConfigAdapter};
use crate::app::{AppContainer, DefaultAppContainer, JobCoordinator};
use crate::cli::args::{BatchArgs, DownloadArgs, ListArgs, SweepArgs};
use crate::domain::model::{Artifact, DownloadRequest, OwnerId};
use crate::error::{ClipCutError, ClipCutResult};
use crate::utils::path::sweep_stray_raw_files;
use crate::utils::Utils;

/// One entry of a batch request file
#[derive(Debug, Clone, Deserialize)]
pub struct BatchEntry {
    pub link: String,
    pub owner: String,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl BatchEntry {
    pub fn to_request(&self) -> ClipCutResult<DownloadRequest> {
        Ok(DownloadRequest::from_parts(
            &self.link,
            self.start.as_deref(),
            self.end.as_deref(),
            &self.owner,
        )?)
    }
}

/// Outcome of one batch entry as printed to stdout
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchOutcome {
    fn from_result(index: usize, result: ClipCutResult<Artifact>) -> Self {
        match result {
            Ok(artifact) => Self {
                index,
                artifact: Some(artifact),
                error_kind: None,
                error: None,
            },
            Err(e) => Self {
                index,
                artifact: None,
                error_kind: Some(e.kind()),
                error: Some(e.to_string()),
            },
        }
    }
}

async fn coordinator(config: &AppConfig) -> Result<Arc<JobCoordinator>> {
    let container = DefaultAppContainer::from_config(config)
        .await
        .map_err(ClipCutError::from)?;
    Ok(container.job_coordinator())
}

/// Execute the download command
pub async fn download(config: &AppConfig, args: DownloadArgs) -> Result<()> {
    // Rejected before the container touches the filesystem
    let request = DownloadRequest::from_parts(
        &args.link,
        args.start.as_deref(),
        args.end.as_deref(),
        &args.owner,
    )
    .map_err(ClipCutError::from)?;

    let coordinator = coordinator(config).await?;
    let artifact = coordinator.run(request).await?;

    if args.summary {
        println!(
            "{}  {}  {}",
            artifact.filename,
            Utils::format_file_size(artifact.size_bytes),
            artifact.title
        );
    } else {
        println!("{}", serde_json::to_string_pretty(&artifact)?);
    }
    Ok(())
}

/// Execute the list command
pub async fn list(config: &AppConfig, args: ListArgs) -> Result<()> {
    let coordinator = coordinator(config).await?;
    let artifacts = coordinator.list_by_owner(&OwnerId::new(args.owner)).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&artifacts)?);
        return Ok(());
    }

    for artifact in &artifacts {
        println!(
            "{}  {:<44}  {:>9}  {:>8}  {}",
            artifact.created_at.format("%Y-%m-%d %H:%M:%S"),
            artifact.filename,
            Utils::format_file_size(artifact.size_bytes),
            artifact.duration_label.as_deref().unwrap_or("-"),
            artifact.title
        );
    }
    info!(count = artifacts.len(), "listed artifacts");
    Ok(())
}

/// Execute the batch command
pub async fn batch(config: &AppConfig, args: BatchArgs) -> Result<()> {
    let content = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read batch file {}", args.file.display()))?;
    let entries: Vec<BatchEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Malformed batch file {}", args.file.display()))?;

    let outcomes = run_entries(config, &entries).await?;
    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();

    println!("{}", serde_json::to_string_pretty(&outcomes)?);

    if failed > 0 {
        anyhow::bail!("{} of {} jobs failed", failed, outcomes.len());
    }
    Ok(())
}

/// Validate every entry, run the valid ones and merge outcomes in file order
async fn run_entries(config: &AppConfig, entries: &[BatchEntry]) -> Result<Vec<BatchOutcome>> {
    let mut outcomes: Vec<Option<BatchOutcome>> = Vec::with_capacity(entries.len());
    let mut pending = Vec::new();
    let mut requests = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        match entry.to_request() {
            Ok(request) => {
                pending.push(index);
                requests.push(request);
                outcomes.push(None);
            }
            Err(e) => outcomes.push(Some(BatchOutcome::from_result(index, Err(e)))),
        }
    }

    if !requests.is_empty() {
        let coordinator = coordinator(config).await?;
        let results = coordinator.run_batch(requests).await;
        for (index, result) in pending.into_iter().zip(results) {
            outcomes[index] = Some(BatchOutcome::from_result(index, result));
        }
    }

    Ok(outcomes.into_iter().flatten().collect())
}

/// Execute the sweep command
pub fn sweep(config: &AppConfig, args: SweepArgs) -> Result<()> {
    let dir: &Path = &config.downloads_dir;
    if !dir.is_dir() {
        info!(dir = %dir.display(), "downloads dir does not exist, nothing to sweep");
        return Ok(());
    }

    let removed = sweep_stray_raw_files(dir, Duration::from_secs(args.older_than_secs))
        .with_context(|| format!("Failed to sweep {}", dir.display()))?;
    for path in &removed {
        println!("{}", path.display());
    }
    info!(removed = removed.len(), "sweep finished");
    Ok(())
}

/// Execute the config command
pub fn show_config(config: &AppConfig) -> Result<()> {
    let rendered = TomlConfigAdapter::render(config).map_err(ClipCutError::from)?;
    print!("{}", rendered);
    Ok(())
}
