// Trimmer - Cuts an acquired file down to the requested range

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::model::*;
use crate::error::{ClipCutError, ClipCutResult};
use crate::ports::*;
use crate::utils::path::remove_if_exists;

/// A trimmed output file
#[derive(Debug, Clone, PartialEq)]
pub struct TrimmedMedia {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Interactor for the trimming stage
pub struct Trimmer {
    transcoder: Arc<dyn TranscodePort>,
}

impl Trimmer {
    /// Create new trimmer with injected transcoder
    pub fn new(transcoder: Arc<dyn TranscodePort>) -> Self {
        Self { transcoder }
    }

    /// Re-encode `range` of `input` into `output`. The input is left alone; a
    /// partial output is removed on failure.
    pub async fn trim(
        &self,
        input: &Path,
        range: &TimeRange,
        output: &Path,
    ) -> ClipCutResult<TrimmedMedia> {
        info!(
            transcoder = self.transcoder.name(),
            start = %range.start,
            end = %range.end,
            "trimming"
        );

        let result = self.run(input, range, output).await;
        if let Err(e) = &result {
            warn!(error = %e, "trim failed");
            if let Err(e) = remove_if_exists(output).await {
                warn!(path = %output.display(), error = %e, "failed to remove partial output");
            }
        }
        result
    }

    async fn run(
        &self,
        input: &Path,
        range: &TimeRange,
        output: &Path,
    ) -> ClipCutResult<TrimmedMedia> {
        let report = self
            .transcoder
            .trim(input, range, output)
            .await
            .map_err(|e| ClipCutError::TrimFailed {
                reason: e.to_string(),
            })?;

        if !report.success {
            let code = report
                .exit_code
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            return Err(ClipCutError::TrimFailed {
                reason: format!("{} exited with {}", self.transcoder.name(), code),
            });
        }

        let size_bytes = match tokio::fs::metadata(output).await {
            Ok(metadata) if metadata.is_file() && metadata.len() > 0 => metadata.len(),
            _ => {
                return Err(ClipCutError::TrimFailed {
                    reason: format!("{} produced no output", self.transcoder.name()),
                })
            }
        };

        Ok(TrimmedMedia {
            path: output.to_path_buf(),
            size_bytes,
        })
    }
}
