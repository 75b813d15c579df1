// Ports - Interface definitions (contracts)

use std::path::Path;

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;

/// How an external process ended
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessReport {
    /// Whether the process exited with status 0
    pub success: bool,
    /// Exit code, absent when the process was killed by a signal
    pub exit_code: Option<i32>,
}

impl ProcessReport {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            exit_code: Some(0),
        }
    }

    pub fn failed(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
        }
    }
}

/// Port for the external extractor that resolves a link into a media file
#[async_trait]
pub trait ExtractPort: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Run one extraction attempt with a single selector, writing to `output`.
    ///
    /// A non-zero exit is reported in the returned [`ProcessReport`]; `Err` is
    /// reserved for failures to start or await the process.
    async fn fetch(
        &self,
        source_link: &str,
        selector: &FormatSelector,
        output: &Path,
    ) -> Result<ProcessReport, DomainError>;
}

/// Port for the external transcoder that cuts and re-encodes media
#[async_trait]
pub trait TranscodePort: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Cut `input` to `range`, re-encoding into `output`. Never modifies `input`.
    async fn trim(
        &self,
        input: &Path,
        range: &TimeRange,
        output: &Path,
    ) -> Result<ProcessReport, DomainError>;
}

/// Port for the durable artifact registry
#[async_trait]
pub trait ArtifactStorePort: Send + Sync {
    /// Persist a new record, assigning its id and creation time.
    ///
    /// Fails with [`DomainError::Conflict`] when the filename is already taken.
    async fn create(&self, artifact: NewArtifact) -> Result<Artifact, DomainError>;

    /// All records of an owner, newest first
    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<Artifact>, DomainError>;

    /// Look up the record for a file in the downloads directory
    async fn get_by_filename(&self, filename: &str) -> Result<Option<Artifact>, DomainError>;
}
