// Domain models - Core types and data structures

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// Time offset into a video, in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Create a new TimeSpec from hours, minutes, seconds, milliseconds
    pub fn from_components(hours: u32, minutes: u32, seconds: u32, milliseconds: u32) -> Self {
        let total_seconds = hours as f64 * 3600.0
            + minutes as f64 * 60.0
            + seconds as f64
            + milliseconds as f64 / 1000.0;
        Self {
            seconds: total_seconds,
        }
    }

    /// Parse time string: `SS[.ms]`, `MM:SS[.ms]` or `HH:MM:SS[.ms]`
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();
        if trimmed.is_empty() {
            return Err(DomainError::BadArgs("Time cannot be empty".to_string()));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let seconds = match parts.as_slice() {
            [secs] => Self::parse_seconds(secs, false)?,
            [mins, secs] => {
                let minutes = Self::parse_unit(mins, "minutes")?;
                minutes as f64 * 60.0 + Self::parse_seconds(secs, true)?
            }
            [hours, mins, secs] => {
                let hours = Self::parse_unit(hours, "hours")?;
                let minutes = Self::parse_unit(mins, "minutes")?;
                if minutes >= 60 {
                    return Err(DomainError::BadArgs(
                        "Minutes must be less than 60".to_string(),
                    ));
                }
                hours as f64 * 3600.0 + minutes as f64 * 60.0 + Self::parse_seconds(secs, true)?
            }
            _ => {
                return Err(DomainError::BadArgs(format!(
                    "Invalid time format '{}'. Supported formats: seconds (e.g., 12.5), MM:SS (e.g., 2:30), HH:MM:SS (e.g., 1:02:30)",
                    trimmed
                )))
            }
        };

        Ok(Self::from_seconds(seconds))
    }

    fn parse_unit(part: &str, name: &str) -> Result<u32, DomainError> {
        part.parse::<u32>()
            .map_err(|_| DomainError::BadArgs(format!("Invalid {} value '{}'", name, part)))
    }

    fn parse_seconds(part: &str, bounded: bool) -> Result<f64, DomainError> {
        let seconds = part
            .parse::<f64>()
            .map_err(|_| DomainError::BadArgs(format!("Invalid seconds value '{}'", part)))?;
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(DomainError::BadArgs(
                "Time must be a non-negative number".to_string(),
            ));
        }
        if bounded && seconds >= 60.0 {
            return Err(DomainError::BadArgs(
                "Seconds must be less than 60".to_string(),
            ));
        }
        Ok(seconds)
    }

    /// Whole milliseconds, the precision the transcoder is given
    pub fn total_millis(&self) -> u64 {
        (self.seconds * 1000.0).round() as u64
    }

    /// Format as `HH:MM:SS.mmm`, the form handed to the transcoder
    pub fn format_hms(&self) -> String {
        let total_millis = self.total_millis();
        let hours = total_millis / 3_600_000;
        let minutes = (total_millis % 3_600_000) / 60_000;
        let seconds = (total_millis % 60_000) / 1000;
        let milliseconds = total_millis % 1000;
        format!(
            "{:02}:{:02}:{:02}.{:03}",
            hours, minutes, seconds, milliseconds
        )
    }

    /// Format as a short clock label: `MM:SS`, or `H:MM:SS` past one hour
    pub fn format_clock(&self) -> String {
        let total_seconds = self.seconds.round() as u64;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let secs = total_seconds % 60;

        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, secs)
        } else {
            format!("{:02}:{:02}", minutes, secs)
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// Bounded segment of a video; `end` is strictly after `start`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: TimeSpec,
    pub end: TimeSpec,
}

impl TimeRange {
    pub fn new(start: TimeSpec, end: TimeSpec) -> Result<Self, DomainError> {
        // Bounds are compared as the transcoder will see them
        if end.total_millis() <= start.total_millis() {
            return Err(DomainError::BadArgs(format!(
                "End time ({}) must be after start time ({})",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Length of the segment
    pub fn duration(&self) -> TimeSpec {
        TimeSpec::from_seconds(self.end.seconds - self.start.seconds)
    }
}

/// Opaque identifier of the requesting user, validated upstream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated request to fetch a video, optionally trimmed to a range
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub source_link: Url,
    pub range: Option<TimeRange>,
    pub owner_id: OwnerId,
}

impl DownloadRequest {
    /// Create new request with validation
    pub fn new(
        source_link: &str,
        start: Option<TimeSpec>,
        end: Option<TimeSpec>,
        owner_id: OwnerId,
    ) -> Result<Self, DomainError> {
        let source_link = Self::parse_link(source_link)?;

        let range = match (start, end) {
            (None, None) => None,
            (Some(start), Some(end)) => Some(TimeRange::new(start, end)?),
            (Some(_), None) => {
                return Err(DomainError::BadArgs(
                    "Start time given without an end time".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(DomainError::BadArgs(
                    "End time given without a start time".to_string(),
                ))
            }
        };

        if owner_id.as_str().trim().is_empty() {
            return Err(DomainError::BadArgs("Owner id cannot be empty".to_string()));
        }

        Ok(Self {
            source_link,
            range,
            owner_id,
        })
    }

    /// Create request from raw strings as received from the CLI layer
    pub fn from_parts(
        source_link: &str,
        start: Option<&str>,
        end: Option<&str>,
        owner_id: &str,
    ) -> Result<Self, DomainError> {
        let start = start.map(TimeSpec::parse).transpose()?;
        let end = end.map(TimeSpec::parse).transpose()?;
        Self::new(source_link, start, end, OwnerId::new(owner_id))
    }

    fn parse_link(link: &str) -> Result<Url, DomainError> {
        let url = Url::parse(link.trim())
            .map_err(|e| DomainError::BadArgs(format!("Malformed link '{}': {}", link, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DomainError::BadArgs(format!(
                "Unsupported link scheme '{}'",
                url.scheme()
            )));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(DomainError::BadArgs(format!("Link has no host: {}", link)));
        }
        Ok(url)
    }

    /// Whether the request asks for a trimmed clip rather than the full video
    pub fn is_trim(&self) -> bool {
        self.range.is_some()
    }

    /// Human-readable name of the hosting site
    pub fn source_platform(&self) -> String {
        let host = self
            .source_link
            .host_str()
            .unwrap_or_default()
            .trim_start_matches("www.")
            .trim_start_matches("m.");
        match host {
            "youtube.com" | "youtu.be" | "music.youtube.com" => "YouTube".to_string(),
            "vimeo.com" | "player.vimeo.com" => "Vimeo".to_string(),
            other => other.to_string(),
        }
    }
}

/// Token telling the extractor which stream combination to fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatSelector(pub String);

impl FormatSelector {
    /// Selector accepting any available track
    pub const BEST: &'static str = "best";

    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this selector is the widest-compatibility fallback
    pub fn is_best_effort(&self) -> bool {
        self.0 == Self::BEST
    }
}

impl fmt::Display for FormatSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier unique to one job; every file the job writes is named after it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// States of a single download job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Pending,
    Acquiring,
    Trimming,
    Registering,
    Done,
    Failed,
}

impl JobStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Done | JobStage::Failed)
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::Pending => "pending",
            JobStage::Acquiring => "acquiring",
            JobStage::Trimming => "trimming",
            JobStage::Registering => "registering",
            JobStage::Done => "done",
            JobStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Artifact metadata before the store assigns identity
#[derive(Debug, Clone, PartialEq)]
pub struct NewArtifact {
    pub owner_id: OwnerId,
    pub filename: String,
    pub source_link: String,
    pub source_platform: String,
    pub title: String,
    pub duration_label: Option<String>,
    pub size_bytes: u64,
    pub file_size_mb: f64,
    pub format: String,
}

/// Durable record of a produced media file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub filename: String,
    pub source_link: String,
    pub source_platform: String,
    pub title: String,
    pub duration_label: Option<String>,
    pub size_bytes: u64,
    #[serde(rename = "fileSizeMB")]
    pub file_size_mb: f64,
    pub format: String,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Attach store-assigned identity to new metadata
    pub fn from_new(new: NewArtifact, id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id: new.owner_id,
            filename: new.filename,
            source_link: new.source_link,
            source_platform: new.source_platform,
            title: new.title,
            duration_label: new.duration_label,
            size_bytes: new.size_bytes,
            file_size_mb: new.file_size_mb,
            format: new.format,
            created_at,
        }
    }
}
