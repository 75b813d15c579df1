//! ClipCut video clipper library
//!
//! Fetches videos with an external extractor, walking a ladder of format
//! selectors until one yields a usable file, optionally trims the result with
//! an external transcoder and records every produced file in a per-owner
//! artifact registry.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{DefaultAppContainer, JobCoordinator};
pub use domain::errors::DomainError;
pub use domain::model::{
    Artifact, DownloadRequest, FormatSelector, JobId, JobStage, NewArtifact, OwnerId, TimeRange,
    TimeSpec,
};
pub use domain::rules::FormatLadder;
pub use error::{ClipCutError, ClipCutResult};
