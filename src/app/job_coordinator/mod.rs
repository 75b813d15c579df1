// Job coordinator - Drives one request through acquire, trim and register

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::{timeout_at, Instant};
use tracing::{info, info_span, warn, Instrument};

use crate::adapters::toml_config::AppConfig;
use crate::app::acquirer::Acquirer;
use crate::app::trimmer::Trimmer;
use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::error::{ClipCutError, ClipCutResult};
use crate::ports::*;
use crate::utils::path::{remove_if_exists, remove_job_files};

/// Wait after a deadline kill before sweeping the job's files
const KILL_GRACE: Duration = Duration::from_millis(250);

/// Settings shared by every job of a coordinator
#[derive(Debug, Clone, PartialEq)]
pub struct JobSettings {
    pub ladder: FormatLadder,
    pub downloads_dir: PathBuf,
    /// Container extension without the leading dot
    pub extension: String,
    pub job_timeout: Duration,
    pub max_concurrent_jobs: usize,
}

impl JobSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        Ok(Self {
            ladder: config.ladder()?,
            downloads_dir: config.downloads_dir.clone(),
            extension: config.output_extension.trim_start_matches('.').to_string(),
            job_timeout: config.job_timeout(),
            max_concurrent_jobs: config.max_concurrent_jobs.max(1),
        })
    }
}

/// Runs download requests end to end.
///
/// Each job owns the files named after its [`JobId`]; whatever path a job
/// takes, none of them survive except the registered artifact.
pub struct JobCoordinator {
    acquirer: Acquirer,
    trimmer: Trimmer,
    store: Arc<dyn ArtifactStorePort>,
    settings: JobSettings,
}

impl JobCoordinator {
    /// Create new coordinator with injected stages and store
    pub fn new(
        acquirer: Acquirer,
        trimmer: Trimmer,
        store: Arc<dyn ArtifactStorePort>,
        settings: JobSettings,
    ) -> Self {
        Self {
            acquirer,
            trimmer,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    /// Run one request to completion
    pub async fn run(&self, request: DownloadRequest) -> ClipCutResult<Artifact> {
        let files = JobFiles::new(
            JobId::new(),
            &self.settings.downloads_dir,
            &self.settings.extension,
        );
        let span = info_span!(
            "job",
            job_id = %files.job_id(),
            owner = %request.owner_id,
            trim = request.is_trim()
        );

        async {
            info!(stage = %JobStage::Pending, link = %request.source_link, "job accepted");
            let deadline = Instant::now() + self.settings.job_timeout;

            match self.drive(&request, &files, deadline).await {
                Ok(artifact) => {
                    let final_path = files.dir().join(&artifact.filename);
                    remove_job_files(&files, Some(final_path.as_path())).await;
                    info!(
                        stage = %JobStage::Done,
                        filename = %artifact.filename,
                        size_bytes = artifact.size_bytes,
                        "job finished"
                    );
                    Ok(artifact)
                }
                Err(e) => {
                    if matches!(e, ClipCutError::Timeout { .. }) {
                        // Killed helpers may still be closing files they had open
                        tokio::time::sleep(KILL_GRACE).await;
                    }
                    let removed = remove_job_files(&files, None).await;
                    warn!(
                        stage = %JobStage::Failed,
                        kind = e.kind(),
                        removed = removed.len(),
                        error = %e,
                        "job failed"
                    );
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        request: &DownloadRequest,
        files: &JobFiles,
        deadline: Instant,
    ) -> ClipCutResult<Artifact> {
        let raw_path = files.raw_path();
        let acquired = self
            .with_deadline(
                JobStage::Acquiring,
                deadline,
                self.acquirer
                    .acquire(request.source_link.as_str(), &self.settings.ladder, &raw_path),
            )
            .await?;

        let (final_path, size_bytes) = match &request.range {
            Some(range) => {
                let snippet_path = files.snippet_path();
                let trimmed = self
                    .with_deadline(
                        JobStage::Trimming,
                        deadline,
                        self.trimmer.trim(&acquired.path, range, &snippet_path),
                    )
                    .await;
                discard(&acquired.path).await;
                let trimmed = trimmed?;
                (trimmed.path, trimmed.size_bytes)
            }
            None => {
                let full_path = files.full_path();
                tokio::fs::rename(&acquired.path, &full_path).await?;
                (full_path, acquired.size_bytes)
            }
        };

        info!(stage = %JobStage::Registering, path = %final_path.display(), "registering artifact");
        self.register(request, &final_path, size_bytes).await
    }

    /// Persist the record for a finished file. Not bound by the job deadline:
    /// an abandoned store write could land after the file is cleaned up.
    async fn register(
        &self,
        request: &DownloadRequest,
        path: &Path,
        size_bytes: u64,
    ) -> ClipCutResult<Artifact> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ClipCutError::PersistenceFailed {
                reason: format!("Unusable artifact path {}", path.display()),
            })?
            .to_string();

        let new = NewArtifact {
            owner_id: request.owner_id.clone(),
            filename,
            source_link: request.source_link.to_string(),
            source_platform: request.source_platform(),
            title: ArtifactLabels::title(request),
            duration_label: ArtifactLabels::duration_label(request.range.as_ref()),
            size_bytes,
            file_size_mb: ArtifactLabels::size_mb(size_bytes),
            format: ArtifactLabels::format(&self.settings.extension),
        };

        self.store
            .create(new)
            .await
            .map_err(|e| ClipCutError::PersistenceFailed {
                reason: e.to_string(),
            })
    }

    /// Run `stage` until `deadline`. Dropping the stage future on expiry
    /// kills any child process it spawned.
    async fn with_deadline<T, F>(&self, stage: JobStage, deadline: Instant, fut: F) -> ClipCutResult<T>
    where
        F: Future<Output = ClipCutResult<T>>,
    {
        info!(stage = %stage, "entering stage");
        match timeout_at(deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(ClipCutError::Timeout {
                stage,
                after: self.settings.job_timeout,
            }),
        }
    }

    /// Run many requests, at most `max_concurrent_jobs` at a time. Results
    /// come back in input order.
    pub async fn run_batch(
        self: &Arc<Self>,
        requests: Vec<DownloadRequest>,
    ) -> Vec<ClipCutResult<Artifact>> {
        let permits = Arc::new(Semaphore::new(self.settings.max_concurrent_jobs));
        info!(
            jobs = requests.len(),
            max_concurrent = self.settings.max_concurrent_jobs,
            "starting batch"
        );

        let handles: Vec<_> = requests
            .into_iter()
            .map(|request| {
                let coordinator = Arc::clone(self);
                let permits = Arc::clone(&permits);
                tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await.map_err(|e| {
                        ClipCutError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
                    })?;
                    coordinator.run(request).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.unwrap_or_else(|e| {
                Err(ClipCutError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("job task aborted: {}", e),
                )))
            }));
        }
        results
    }

    /// Artifacts of `owner_id`, newest first
    pub async fn list_by_owner(&self, owner_id: &OwnerId) -> ClipCutResult<Vec<Artifact>> {
        Ok(self.store.list_by_owner(owner_id).await?)
    }

    pub async fn get_by_filename(&self, filename: &str) -> ClipCutResult<Option<Artifact>> {
        Ok(self.store.get_by_filename(filename).await?)
    }
}

/// Delete an intermediate file, logging instead of failing
async fn discard(path: &Path) {
    if let Err(e) = remove_if_exists(path).await {
        warn!(path = %path.display(), error = %e, "failed to remove intermediate file");
    }
}
