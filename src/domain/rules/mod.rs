// Domain rules - Retry ladder, naming scheme and labelling policies

use std::path::{Path, PathBuf};

use crate::domain::errors::*;
use crate::domain::model::*;

/// Ladder used when no configuration overrides it
pub const DEFAULT_LADDER: &[&str] = &["22", "18", "137+140", "136+140", "135+140", "best"];

/// Ordered, non-empty list of format selectors tried one after another.
///
/// The last rung is always [`FormatSelector::BEST`]; a configured ladder that
/// forgets it gets it appended.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatLadder {
    selectors: Vec<FormatSelector>,
}

impl FormatLadder {
    /// Build a ladder from selector tokens, skipping blanks and duplicates
    pub fn new<I, S>(tokens: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selectors: Vec<FormatSelector> = Vec::new();
        for token in tokens {
            let token = token.as_ref().trim();
            if token.is_empty() {
                continue;
            }
            let selector = FormatSelector::new(token);
            if !selectors.contains(&selector) {
                selectors.push(selector);
            }
        }

        if selectors.is_empty() {
            return Err(DomainError::InvalidConfig(
                "Format ladder must contain at least one selector".to_string(),
            ));
        }

        // "best" belongs at the bottom only
        if let Some(pos) = selectors.iter().position(FormatSelector::is_best_effort) {
            let best = selectors.remove(pos);
            selectors.push(best);
        } else {
            selectors.push(FormatSelector::new(FormatSelector::BEST));
        }

        Ok(Self { selectors })
    }

    /// Parse a comma-separated ladder such as `"22,18,best"`
    pub fn parse(list: &str) -> Result<Self, DomainError> {
        Self::new(list.split(','))
    }

    /// Selector at `index`, or `None` once the ladder is exhausted
    pub fn next(&self, index: usize) -> Option<&FormatSelector> {
        self.selectors.get(index)
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormatSelector> {
        self.selectors.iter()
    }

    pub fn to_tokens(&self) -> Vec<String> {
        self.selectors.iter().map(|s| s.0.clone()).collect()
    }
}

impl Default for FormatLadder {
    fn default() -> Self {
        Self {
            selectors: DEFAULT_LADDER.iter().map(|t| FormatSelector::new(*t)).collect(),
        }
    }
}

/// Paths owned by one job inside the shared downloads directory.
///
/// Every name embeds the job id, so concurrent jobs never collide and all
/// files a job leaves behind can be found by prefix.
#[derive(Debug, Clone)]
pub struct JobFiles {
    job_id: JobId,
    dir: PathBuf,
    extension: String,
}

impl JobFiles {
    pub const RAW_PREFIX: &'static str = "raw-";
    pub const SNIPPET_PREFIX: &'static str = "snippet-";
    pub const FULL_PREFIX: &'static str = "full-";

    pub fn new(job_id: JobId, dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            job_id,
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Transient download target
    pub fn raw_path(&self) -> PathBuf {
        self.dir.join(self.filename(Self::RAW_PREFIX))
    }

    /// Final file for trim mode
    pub fn snippet_path(&self) -> PathBuf {
        self.dir.join(self.filename(Self::SNIPPET_PREFIX))
    }

    /// Final file for full-video mode
    pub fn full_path(&self) -> PathBuf {
        self.dir.join(self.filename(Self::FULL_PREFIX))
    }

    fn filename(&self, prefix: &str) -> String {
        format!("{}{}.{}", prefix, self.job_id, self.extension)
    }

    /// Name stems that identify files written on behalf of this job
    pub fn stems(&self) -> [String; 3] {
        [
            format!("{}{}", Self::RAW_PREFIX, self.job_id),
            format!("{}{}", Self::SNIPPET_PREFIX, self.job_id),
            format!("{}{}", Self::FULL_PREFIX, self.job_id),
        ]
    }

    /// Whether `file_name` belongs to this job
    pub fn owns(&self, file_name: &str) -> bool {
        self.stems().iter().any(|stem| file_name.starts_with(stem.as_str()))
    }
}

/// Builds the descriptive fields of an artifact record
pub struct ArtifactLabels;

impl ArtifactLabels {
    /// Clip title as shown in listings
    pub fn title(request: &DownloadRequest) -> String {
        match &request.range {
            Some(range) => format!(
                "Clip {}–{} from {}",
                range.start.format_clock(),
                range.end.format_clock(),
                request.source_link
            ),
            None => format!("Full download from {}", request.source_link),
        }
    }

    /// Length of the produced media; unknown for full downloads
    pub fn duration_label(range: Option<&TimeRange>) -> Option<String> {
        range.map(|r| r.duration().format_clock())
    }

    /// Size in megabytes rounded to one decimal
    pub fn size_mb(size_bytes: u64) -> f64 {
        let mb = size_bytes as f64 / 1_048_576.0;
        (mb * 10.0).round() / 10.0
    }

    /// Container label derived from the file extension
    pub fn format(extension: &str) -> String {
        extension.trim_start_matches('.').to_uppercase()
    }
}
