// Acquirer - Walks the format ladder until one selector yields a usable file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::model::*;
use crate::domain::rules::*;
use crate::error::{ClipCutError, ClipCutResult};
use crate::ports::*;
use crate::utils::path::remove_with_leftovers;

/// A file produced by a successful extraction attempt
#[derive(Debug, Clone, PartialEq)]
pub struct AcquiredMedia {
    pub path: PathBuf,
    /// Selector that produced the file
    pub selector: FormatSelector,
    /// Attempts made, including the successful one
    pub attempts: usize,
    pub size_bytes: u64,
}

/// Interactor for the acquisition stage
pub struct Acquirer {
    extractor: Arc<dyn ExtractPort>,
    min_file_bytes: u64,
}

impl Acquirer {
    /// Create new acquirer with injected extractor
    pub fn new(extractor: Arc<dyn ExtractPort>, min_file_bytes: u64) -> Self {
        Self {
            extractor,
            min_file_bytes,
        }
    }

    /// Try each selector of `ladder` in order, writing to `output`.
    ///
    /// An attempt counts only when the extractor exits cleanly and leaves a
    /// file larger than the configured minimum at `output`. Whatever a failed
    /// attempt wrote is removed before the next one starts.
    pub async fn acquire(
        &self,
        source_link: &str,
        ladder: &FormatLadder,
        output: &Path,
    ) -> ClipCutResult<AcquiredMedia> {
        let mut attempted = Vec::with_capacity(ladder.len());

        while let Some(selector) = ladder.next(attempted.len()) {
            attempted.push(selector.to_string());
            let attempt = attempted.len();

            info!(
                extractor = self.extractor.name(),
                selector = %selector,
                attempt,
                "acquisition attempt"
            );

            match self.extractor.fetch(source_link, selector, output).await {
                Ok(report) if report.success => {
                    if let Some(size_bytes) = self.validate_output(output).await {
                        info!(selector = %selector, attempt, size_bytes, "acquisition succeeded");
                        return Ok(AcquiredMedia {
                            path: output.to_path_buf(),
                            selector: selector.clone(),
                            attempts: attempt,
                            size_bytes,
                        });
                    }
                    warn!(
                        selector = %selector,
                        attempt,
                        min_bytes = self.min_file_bytes,
                        "extractor exited cleanly but output is missing or too small"
                    );
                }
                Ok(report) => {
                    warn!(selector = %selector, attempt, code = ?report.exit_code, "extractor failed");
                }
                Err(e) => {
                    warn!(selector = %selector, attempt, error = %e, "extractor could not run");
                }
            }

            remove_with_leftovers(output).await;
        }

        Err(ClipCutError::AcquisitionExhausted { attempted })
    }

    /// Size of `output` when it passes the minimum size check
    async fn validate_output(&self, output: &Path) -> Option<u64> {
        let metadata = tokio::fs::metadata(output).await.ok()?;
        (metadata.is_file() && metadata.len() > self.min_file_bytes).then(|| metadata.len())
    }
}
