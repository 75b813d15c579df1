//! Error handling module for ClipCut
//!
//! Every variant carries a message that can be shown to the requesting user
//! as-is. Failures of a single format attempt never reach this type; they are
//! retried inside the acquirer.

use std::time::Duration;

use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::model::JobStage;

/// Main error type for ClipCut operations
#[derive(Error, Debug)]
pub enum ClipCutError {
    /// Malformed link or inconsistent time range, rejected before any process runs
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Every selector in the format ladder failed
    #[error("Source unavailable: no downloadable format after trying {}", attempted.join(", "))]
    AcquisitionExhausted { attempted: Vec<String> },

    /// Transcoder failed or produced no output
    #[error("Processing failed: {reason}")]
    TrimFailed { reason: String },

    /// Artifact record could not be stored
    #[error("Save failed: {reason}")]
    PersistenceFailed { reason: String },

    /// Job deadline elapsed while a stage was running
    #[error("Timed out after {}s while {stage}", after.as_secs())]
    Timeout { stage: JobStage, after: Duration },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O error outside of a job
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClipCutError {
    /// Short, stable label used in logs and JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::AcquisitionExhausted { .. } => "acquisition_exhausted",
            Self::TrimFailed { .. } => "trim_failed",
            Self::PersistenceFailed { .. } => "persistence_failed",
            Self::Timeout { .. } => "timeout",
            Self::Config { .. } => "config",
            Self::Io(_) => "io",
        }
    }
}

impl From<DomainError> for ClipCutError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::BadArgs(reason) => Self::InvalidRequest { reason },
            DomainError::InvalidConfig(message) => Self::Config { message },
            DomainError::Conflict(reason) | DomainError::StoreFail(reason) => {
                Self::PersistenceFailed { reason }
            }
            other => Self::Io(std::io::Error::new(std::io::ErrorKind::Other, other)),
        }
    }
}

/// Result type alias for ClipCut operations
pub type ClipCutResult<T> = std::result::Result<T, ClipCutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message_lists_selectors() {
        let err = ClipCutError::AcquisitionExhausted {
            attempted: vec!["22".to_string(), "best".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Source unavailable: no downloadable format after trying 22, best"
        );
        assert_eq!(err.kind(), "acquisition_exhausted");
    }

    #[test]
    fn test_timeout_message_names_stage() {
        let err = ClipCutError::Timeout {
            stage: JobStage::Trimming,
            after: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "Timed out after 30s while trimming");
    }

    #[test]
    fn test_domain_error_mapping() {
        let err: ClipCutError = DomainError::BadArgs("end before start".to_string()).into();
        assert!(matches!(err, ClipCutError::InvalidRequest { .. }));

        let err: ClipCutError = DomainError::Conflict("duplicate".to_string()).into();
        assert!(matches!(err, ClipCutError::PersistenceFailed { .. }));
    }
}
