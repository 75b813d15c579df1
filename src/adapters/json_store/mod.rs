// JSON store adapter - Artifact registry kept in a single JSON file

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
#[cfg(unix)]
use nix::fcntl::{Flock, FlockArg};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Artifact store backed by a JSON array on disk.
///
/// Records are held in insertion order. The file is the only source of
/// truth: every call reads it again, so several stores (or processes) may
/// share one registry. `create` holds an exclusive lock on a `<name>.lock`
/// sibling while it re-reads, checks and rewrites the file, and the rewrite
/// goes through a temporary sibling renamed into place so readers never
/// observe a half-written registry.
pub struct JsonArtifactStore {
    path: PathBuf,
}

impl JsonArtifactStore {
    /// Open the registry at `path`, starting empty when the file does not exist
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let store = Self { path: path.into() };
        let records = store.load().await?;
        info!(path = %store.path.display(), records = records.len(), "artifact registry opened");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<Artifact>, DomainError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_records(&path))
            .await
            .map_err(|e| DomainError::StoreFail(format!("Registry reader panicked: {}", e)))?
    }
}

fn read_records(path: &Path) -> Result<Vec<Artifact>, DomainError> {
    match std::fs::read(path) {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
        Ok(bytes) => serde_json::from_slice::<Vec<Artifact>>(&bytes).map_err(|e| {
            DomainError::StoreFail(format!(
                "Corrupt artifact registry {}: {}",
                path.display(),
                e
            ))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(DomainError::StoreFail(format!(
            "Failed to read artifact registry {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Re-read the registry, append `record` unless its filename is taken, and
/// write the result back. Runs entirely under the registry lock.
fn append_record(path: &Path, record: &Artifact) -> Result<(), DomainError> {
    let _lock = RegistryLock::acquire(path)?;

    let mut records = read_records(path)?;
    if records.iter().any(|r| r.filename == record.filename) {
        return Err(DomainError::Conflict(format!(
            "An artifact named {} already exists",
            record.filename
        )));
    }
    records.push(record.clone());

    let bytes = serde_json::to_vec_pretty(&records)
        .map_err(|e| DomainError::StoreFail(format!("Failed to encode registry: {}", e)))?;
    write_atomically(path, &bytes)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), DomainError> {
    let parent = parent_dir(path);
    let fail = |e: std::io::Error| {
        DomainError::StoreFail(format!("Failed to write {}: {}", path.display(), e))
    };

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}

/// Exclusive advisory lock on the registry's `.lock` sibling, released on drop
struct RegistryLock {
    #[cfg(unix)]
    _guard: Flock<File>,
    #[cfg(not(unix))]
    _guard: File,
}

impl RegistryLock {
    fn acquire(registry: &Path) -> Result<Self, DomainError> {
        let mut name = registry
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "registry".into());
        name.push(".lock");
        let lock_path = parent_dir(registry).join(name);

        let fail = |e: String| {
            DomainError::StoreFail(format!("Failed to lock {}: {}", lock_path.display(), e))
        };

        std::fs::create_dir_all(parent_dir(registry)).map_err(|e| fail(e.to_string()))?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| fail(e.to_string()))?;

        #[cfg(unix)]
        {
            let guard = Flock::lock(file, FlockArg::LockExclusive)
                .map_err(|(_, errno)| fail(errno.to_string()))?;
            Ok(Self { _guard: guard })
        }

        #[cfg(not(unix))]
        {
            Ok(Self { _guard: file })
        }
    }
}

#[async_trait]
impl ArtifactStorePort for JsonArtifactStore {
    async fn create(&self, artifact: NewArtifact) -> Result<Artifact, DomainError> {
        let record = Artifact::from_new(artifact, Uuid::new_v4(), Utc::now());

        let path = self.path.clone();
        let stored = record.clone();
        tokio::task::spawn_blocking(move || append_record(&path, &stored))
            .await
            .map_err(|e| DomainError::StoreFail(format!("Registry writer panicked: {}", e)))??;

        debug!(id = %record.id, filename = %record.filename, "artifact recorded");
        Ok(record)
    }

    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<Artifact>, DomainError> {
        let records = self.load().await?;
        let mut owned: Vec<Artifact> = records
            .into_iter()
            .rev()
            .filter(|r| &r.owner_id == owner_id)
            .collect();
        // Reverse insertion order already puts ties newest first; the stable
        // sort only corrects records whose clocks went backwards
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn get_by_filename(&self, filename: &str) -> Result<Option<Artifact>, DomainError> {
        let records = self.load().await?;
        Ok(records.into_iter().find(|r| r.filename == filename))
    }
}
