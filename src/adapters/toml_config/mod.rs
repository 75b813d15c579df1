// TOML config adapter - Configuration management using TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::errors::*;
use crate::domain::rules::{FormatLadder, DEFAULT_LADDER};

/// Desktop browser user agent sent to video hosts
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Name of the table holding ClipCut settings
const CONFIG_TABLE: &str = "clipcut";

/// Runtime configuration, constructed once at startup and passed to every component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Shared directory holding working files and finished artifacts
    pub downloads_dir: PathBuf,
    /// Artifact registry file; defaults to `clips.json` in the downloads dir
    pub store_path: Option<PathBuf>,
    /// Extractor executable
    pub extractor_path: String,
    /// Transcoder executable
    pub transcoder_path: String,
    /// Format selectors, tried in order
    pub format_ladder: Vec<String>,
    /// Downloads at or below this size are treated as failed attempts
    pub min_file_bytes: u64,
    pub user_agent: String,
    /// Off by default: some hosts serve broken chains and the extractor refuses them
    pub check_certificates: bool,
    pub video_codec: String,
    pub audio_codec: String,
    /// Container extension of produced files
    pub output_extension: String,
    /// Deadline for one whole job
    pub job_timeout_secs: u64,
    /// Upper bound on jobs running at once in batch mode
    pub max_concurrent_jobs: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            downloads_dir: PathBuf::from("downloads"),
            store_path: None,
            extractor_path: "yt-dlp".to_string(),
            transcoder_path: "ffmpeg".to_string(),
            format_ladder: DEFAULT_LADDER.iter().map(|s| s.to_string()).collect(),
            min_file_bytes: 10 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            check_certificates: false,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            output_extension: "mp4".to_string(),
            job_timeout_secs: 900,
            max_concurrent_jobs: num_cpus::get().max(1),
        }
    }
}

impl AppConfig {
    /// Build the retry ladder from the configured selectors
    pub fn ladder(&self) -> Result<FormatLadder, DomainError> {
        FormatLadder::new(&self.format_ladder)
    }

    /// Resolved location of the artifact registry
    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| self.downloads_dir.join("clips.json"))
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), DomainError> {
        self.ladder()?;

        if self.job_timeout_secs == 0 {
            return Err(DomainError::InvalidConfig(
                "job_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(DomainError::InvalidConfig(
                "max_concurrent_jobs must be greater than zero".to_string(),
            ));
        }
        if self.extractor_path.trim().is_empty() || self.transcoder_path.trim().is_empty() {
            return Err(DomainError::InvalidConfig(
                "extractor_path and transcoder_path cannot be empty".to_string(),
            ));
        }
        if self.video_codec.trim().is_empty() || self.audio_codec.trim().is_empty() {
            return Err(DomainError::InvalidConfig(
                "video_codec and audio_codec cannot be empty".to_string(),
            ));
        }
        let extension = self.output_extension.trim_start_matches('.');
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::InvalidConfig(format!(
                "Invalid output_extension '{}'",
                self.output_extension
            )));
        }

        Ok(())
    }
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Config files searched when none is given explicitly
    pub const SEARCH_PATHS: &'static [&'static str] = &["clipcut.toml", "config/clipcut.toml"];

    /// Parse configuration from a TOML document with a `[clipcut]` table.
    ///
    /// Keys missing from the document keep their defaults.
    pub fn parse(toml_content: &str) -> Result<AppConfig, DomainError> {
        let mut parsed: toml::Table = toml::from_str(toml_content).map_err(|e| {
            DomainError::InvalidConfig(format!("Failed to parse TOML config: {}", e))
        })?;

        match parsed.remove(CONFIG_TABLE) {
            Some(section) => section.try_into::<AppConfig>().map_err(|e| {
                DomainError::InvalidConfig(format!("Invalid [{}] section: {}", CONFIG_TABLE, e))
            }),
            None => Ok(AppConfig::default()),
        }
    }

    /// Load configuration from file
    pub fn load_file(path: &Path) -> Result<AppConfig, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::InvalidConfig(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// First existing file among [`Self::SEARCH_PATHS`]
    pub fn find_default_file() -> Option<PathBuf> {
        Self::SEARCH_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file())
    }

    /// Serialize config to a TOML document
    pub fn render(config: &AppConfig) -> Result<String, DomainError> {
        let mut root = toml::Table::new();
        let section = toml::Value::try_from(config)
            .map_err(|e| DomainError::InvalidConfig(format!("Failed to serialize config: {}", e)))?;
        root.insert(CONFIG_TABLE.to_string(), section);
        toml::to_string_pretty(&root)
            .map_err(|e| DomainError::InvalidConfig(format!("Failed to serialize config: {}", e)))
    }
}
