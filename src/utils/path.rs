//! Working-file cleanup inside the downloads directory

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::rules::JobFiles;

/// Remove `path`, treating an already missing file as success
pub async fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Delete every file in the job's directory that belongs to the job, except
/// `keep`. Extractors leave `.part`, `.ytdl` and per-stream fragments next to
/// the requested name, so ownership is decided by name prefix.
///
/// Returns the removed paths. Failures to remove a single file are logged and
/// skipped.
pub async fn remove_job_files(files: &JobFiles, keep: Option<&Path>) -> Vec<PathBuf> {
    let removed = remove_matching(files.dir(), |name| files.owns(name), keep).await;
    for path in &removed {
        debug!(job_id = %files.job_id(), path = %path.display(), "removed job file");
    }
    removed
}

/// Delete `path` together with any sibling whose name starts with its file stem
pub async fn remove_with_leftovers(path: &Path) -> Vec<PathBuf> {
    let (Some(dir), Some(stem)) = (path.parent(), path.file_stem().and_then(|s| s.to_str())) else {
        return match remove_if_exists(path).await {
            Ok(true) => vec![path.to_path_buf()],
            _ => Vec::new(),
        };
    };
    let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
    remove_matching(dir, |name| name.starts_with(stem), None).await
}

async fn remove_matching<F>(dir: &Path, matches: F, keep: Option<&Path>) -> Vec<PathBuf>
where
    F: Fn(&str) -> bool,
{
    let mut removed = Vec::new();

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot list directory for cleanup");
            return removed;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stopped listing directory for cleanup");
                break;
            }
        };

        let path = entry.path();
        let matched = entry.file_name().to_str().map_or(false, &matches);
        if !matched || keep == Some(path.as_path()) {
            continue;
        }

        match remove_if_exists(&path).await {
            Ok(true) => removed.push(path),
            Ok(false) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove file"),
        }
    }

    removed
}

/// Remove `raw-*` working files older than `older_than` left behind by
/// processes that died mid-job. Only the top level of `dir` is scanned.
pub fn sweep_stray_raw_files(dir: &Path, older_than: Duration) -> std::io::Result<Vec<PathBuf>> {
    let now = SystemTime::now();
    let mut removed = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_raw = entry
            .file_name()
            .to_str()
            .map_or(false, |name| name.starts_with(JobFiles::RAW_PREFIX));
        if !is_raw {
            continue;
        }

        let age = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age < older_than {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed.push(entry.path().to_path_buf()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %entry.path().display(), error = %e, "failed to remove stray file"),
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::JobId;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_remove_job_files_keeps_final_and_foreign() {
        let dir = TempDir::new().unwrap();
        let files = JobFiles::new(JobId::new(), dir.path(), "mp4");
        let other = JobFiles::new(JobId::new(), dir.path(), "mp4");

        std::fs::write(files.raw_path(), b"raw").unwrap();
        let part = PathBuf::from(format!("{}.part", files.raw_path().display()));
        std::fs::write(&part, b"part").unwrap();
        std::fs::write(files.full_path(), b"full").unwrap();
        std::fs::write(other.raw_path(), b"other").unwrap();
        std::fs::write(dir.path().join("clips.json"), b"[]").unwrap();

        let full_path = files.full_path();
        let removed = remove_job_files(&files, Some(full_path.as_path())).await;

        assert_eq!(removed.len(), 2);
        assert!(!files.raw_path().exists());
        assert!(!part.exists());
        assert!(files.full_path().exists());
        assert!(other.raw_path().exists());
        assert!(dir.path().join("clips.json").exists());
    }

    #[tokio::test]
    async fn test_remove_with_leftovers() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("raw-1.mp4");
        std::fs::write(&output, b"x").unwrap();
        std::fs::write(dir.path().join("raw-1.f137.mp4.part"), b"x").unwrap();
        std::fs::write(dir.path().join("raw-2.mp4"), b"x").unwrap();

        let removed = remove_with_leftovers(&output).await;
        assert_eq!(removed.len(), 2);
        assert!(dir.path().join("raw-2.mp4").exists());
    }

    #[tokio::test]
    async fn test_remove_if_exists_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        assert!(!remove_if_exists(&dir.path().join("nope")).await.unwrap());
    }

    #[test]
    fn test_sweep_only_touches_raw_files() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("raw-abc.mp4");
        let snippet = dir.path().join("snippet-abc.mp4");
        std::fs::write(&raw, b"x").unwrap();
        std::fs::write(&snippet, b"x").unwrap();

        let removed = sweep_stray_raw_files(dir.path(), Duration::ZERO).unwrap();
        assert_eq!(removed, vec![raw.clone()]);
        assert!(!raw.exists());
        assert!(snippet.exists());
    }

    #[test]
    fn test_sweep_respects_age() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("raw-fresh.mp4");
        std::fs::write(&raw, b"x").unwrap();

        let removed = sweep_stray_raw_files(dir.path(), Duration::from_secs(3600)).unwrap();
        assert!(removed.is_empty());
        assert!(raw.exists());
    }
}
