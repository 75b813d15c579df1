use std::sync::Arc;

use tracing::info;

use crate::adapters::{AppConfig, FFmpegAdapter, JsonArtifactStore, YtDlpAdapter};
use crate::app::{Acquirer, JobCoordinator, JobSettings, Trimmer};
use crate::domain::errors::DomainError;
use crate::ports::{ArtifactStorePort, ExtractPort, TranscodePort};

pub trait AppContainer: Send + Sync {
    fn job_coordinator(&self) -> Arc<JobCoordinator>;
}

/// Wires the production adapters into the application layer
pub struct DefaultAppContainer {
    job_coordinator: Arc<JobCoordinator>,
}

impl DefaultAppContainer {
    pub async fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.downloads_dir)
            .await
            .map_err(|e| {
                DomainError::FsFail(format!(
                    "Failed to create downloads dir {}: {}",
                    config.downloads_dir.display(),
                    e
                ))
            })?;

        let extract_port = Arc::new(YtDlpAdapter::from_config(config));
        let transcode_port = Arc::new(FFmpegAdapter::from_config(config));
        let store_port = Arc::new(JsonArtifactStore::open(config.store_path()).await?);

        info!(
            downloads_dir = %config.downloads_dir.display(),
            store = %store_port.path().display(),
            "container ready"
        );

        Ok(Self::with_ports(
            extract_port as Arc<dyn ExtractPort>,
            transcode_port as Arc<dyn TranscodePort>,
            store_port as Arc<dyn ArtifactStorePort>,
            config.min_file_bytes,
            JobSettings::from_config(config)?,
        ))
    }

    /// Build around arbitrary port implementations
    pub fn with_ports(
        extract_port: Arc<dyn ExtractPort>,
        transcode_port: Arc<dyn TranscodePort>,
        store_port: Arc<dyn ArtifactStorePort>,
        min_file_bytes: u64,
        settings: JobSettings,
    ) -> Self {
        let job_coordinator = Arc::new(JobCoordinator::new(
            Acquirer::new(extract_port, min_file_bytes),
            Trimmer::new(transcode_port),
            store_port,
            settings,
        ));

        Self { job_coordinator }
    }
}

impl AppContainer for DefaultAppContainer {
    fn job_coordinator(&self) -> Arc<JobCoordinator> {
        Arc::clone(&self.job_coordinator)
    }
}
