use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use clipcut::adapters::JsonArtifactStore;
use clipcut::app::{AppContainer, DefaultAppContainer, JobSettings};
use clipcut::ports::*;
use clipcut::*;

/// Stub ports standing in for yt-dlp, ffmpeg and a broken registry
mod test_utils {
    use super::*;

    pub const RAW_BYTES: usize = 64 * 1024;

    /// Succeeds only for selectors in `working`; failed attempts leave a `.part` file
    pub struct StubExtractor {
        pub working: Vec<&'static str>,
        pub delay: Duration,
        pub calls: Mutex<Vec<String>>,
        pub in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
    }

    impl StubExtractor {
        pub fn new(working: Vec<&'static str>) -> Self {
            Self {
                working,
                delay: Duration::ZERO,
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExtractPort for StubExtractor {
        fn name(&self) -> &'static str {
            "stub-extractor"
        }

        async fn fetch(
            &self,
            _source_link: &str,
            selector: &FormatSelector,
            output: &Path,
        ) -> Result<ProcessReport, DomainError> {
            self.calls.lock().unwrap().push(selector.to_string());
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);

            std::fs::write(format!("{}.part", output.display()), b"partial")?;
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.working.contains(&selector.as_str()) {
                std::fs::remove_file(format!("{}.part", output.display()))?;
                std::fs::write(output, vec![7u8; RAW_BYTES])?;
                Ok(ProcessReport::succeeded())
            } else {
                Ok(ProcessReport::failed(1))
            }
        }
    }

    /// Writes a small output file and records the requested bounds
    pub struct StubTranscoder {
        pub exit_code: i32,
        pub delay: Duration,
        pub calls: Mutex<Vec<(PathBuf, TimeRange)>>,
    }

    impl StubTranscoder {
        pub fn new(exit_code: i32) -> Self {
            Self {
                exit_code,
                delay: Duration::ZERO,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn calls(&self) -> Vec<(PathBuf, TimeRange)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TranscodePort for StubTranscoder {
        fn name(&self) -> &'static str {
            "stub-transcoder"
        }

        async fn trim(
            &self,
            input: &Path,
            range: &TimeRange,
            output: &Path,
        ) -> Result<ProcessReport, DomainError> {
            self.calls.lock().unwrap().push((input.to_path_buf(), *range));
            std::fs::write(output, vec![3u8; 2048])?;
            tokio::time::sleep(self.delay).await;
            if self.exit_code == 0 {
                Ok(ProcessReport::succeeded())
            } else {
                Ok(ProcessReport::failed(self.exit_code))
            }
        }
    }

    /// Registry that rejects every write
    pub struct FailingStore;

    #[async_trait]
    impl ArtifactStorePort for FailingStore {
        async fn create(&self, _artifact: NewArtifact) -> Result<Artifact, DomainError> {
            Err(DomainError::StoreFail("disk full".to_string()))
        }

        async fn list_by_owner(&self, _owner_id: &OwnerId) -> Result<Vec<Artifact>, DomainError> {
            Ok(Vec::new())
        }

        async fn get_by_filename(&self, _filename: &str) -> Result<Option<Artifact>, DomainError> {
            Ok(None)
        }
    }

    pub struct Harness {
        pub _root: TempDir,
        pub downloads: PathBuf,
        pub store_path: PathBuf,
    }

    impl Harness {
        pub fn new() -> Self {
            let root = TempDir::new().unwrap();
            let downloads = root.path().join("downloads");
            std::fs::create_dir(&downloads).unwrap();
            let store_path = root.path().join("clips.json");
            Self {
                _root: root,
                downloads,
                store_path,
            }
        }

        pub fn settings(&self, job_timeout: Duration) -> JobSettings {
            JobSettings {
                ladder: FormatLadder::default(),
                downloads_dir: self.downloads.clone(),
                extension: "mp4".to_string(),
                job_timeout,
                max_concurrent_jobs: 2,
            }
        }

        pub async fn coordinator(
            &self,
            extractor: Arc<StubExtractor>,
            transcoder: Arc<StubTranscoder>,
            job_timeout: Duration,
        ) -> Arc<JobCoordinator> {
            let store = Arc::new(JsonArtifactStore::open(&self.store_path).await.unwrap());
            self.coordinator_with_store(extractor, transcoder, store, job_timeout)
        }

        pub fn coordinator_with_store(
            &self,
            extractor: Arc<StubExtractor>,
            transcoder: Arc<StubTranscoder>,
            store: Arc<dyn ArtifactStorePort>,
            job_timeout: Duration,
        ) -> Arc<JobCoordinator> {
            DefaultAppContainer::with_ports(
                extractor,
                transcoder,
                store,
                1024,
                self.settings(job_timeout),
            )
            .job_coordinator()
        }

        /// Names of every file left in the downloads directory
        pub fn files(&self) -> Vec<String> {
            let mut names: Vec<String> = std::fs::read_dir(&self.downloads)
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                .collect();
            names.sort();
            names
        }
    }

    pub fn clip_request(owner: &str) -> DownloadRequest {
        DownloadRequest::from_parts(
            "https://www.youtube.com/watch?v=abc",
            Some("10"),
            Some("20"),
            owner,
        )
        .unwrap()
    }

    pub fn full_request(owner: &str) -> DownloadRequest {
        DownloadRequest::from_parts("https://vimeo.com/123", None, None, owner).unwrap()
    }
}

use test_utils::*;

const LONG: Duration = Duration::from_secs(30);

#[test]
fn test_half_range_is_rejected_before_any_work() {
    let result = DownloadRequest::from_parts("https://youtu.be/abc", Some("10"), None, "u1");
    let err: ClipCutError = result.unwrap_err().into();
    assert!(matches!(err, ClipCutError::InvalidRequest { .. }));

    let result =
        DownloadRequest::from_parts("https://youtu.be/abc", Some("00:00:20"), Some("10"), "u1");
    let err: ClipCutError = result.unwrap_err().into();
    assert!(matches!(err, ClipCutError::InvalidRequest { .. }));
}

#[tokio::test]
async fn test_exhausted_ladder_leaves_no_files() {
    let harness = Harness::new();
    let extractor = Arc::new(StubExtractor::new(vec![]));
    let transcoder = Arc::new(StubTranscoder::new(0));
    let coordinator = harness
        .coordinator(extractor.clone(), transcoder.clone(), LONG)
        .await;

    let result = coordinator.run(clip_request("u1")).await;

    match result {
        Err(ClipCutError::AcquisitionExhausted { attempted }) => {
            assert_eq!(attempted, FormatLadder::default().to_tokens());
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(extractor.calls(), FormatLadder::default().to_tokens());
    assert!(transcoder.calls().is_empty());
    assert!(harness.files().is_empty());
    assert!(coordinator
        .list_by_owner(&OwnerId::new("u1"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_fallback_selector_is_used_without_leftovers() {
    let harness = Harness::new();
    let extractor = Arc::new(StubExtractor::new(vec!["136+140"]));
    let transcoder = Arc::new(StubTranscoder::new(0));
    let coordinator = harness
        .coordinator(extractor.clone(), transcoder.clone(), LONG)
        .await;

    let artifact = coordinator.run(full_request("u1")).await.unwrap();

    assert_eq!(extractor.calls(), vec!["22", "18", "137+140", "136+140"]);
    assert_eq!(harness.files(), vec![artifact.filename.clone()]);
}

#[tokio::test]
async fn test_full_mode_never_trims() {
    let harness = Harness::new();
    let extractor = Arc::new(StubExtractor::new(vec!["22"]));
    let transcoder = Arc::new(StubTranscoder::new(0));
    let coordinator = harness
        .coordinator(extractor.clone(), transcoder.clone(), LONG)
        .await;

    let artifact = coordinator.run(full_request("u1")).await.unwrap();

    assert!(transcoder.calls().is_empty());
    assert!(artifact.filename.starts_with("full-"));
    assert_eq!(artifact.size_bytes, RAW_BYTES as u64);
    assert_eq!(artifact.duration_label, None);
    assert_eq!(artifact.source_platform, "Vimeo");
    assert_eq!(harness.files(), vec![artifact.filename.clone()]);
}

#[tokio::test]
async fn test_trim_receives_exact_bounds_and_raw_is_removed() {
    let harness = Harness::new();
    let extractor = Arc::new(StubExtractor::new(vec!["22"]));
    let transcoder = Arc::new(StubTranscoder::new(0));
    let coordinator = harness
        .coordinator(extractor.clone(), transcoder.clone(), LONG)
        .await;

    let artifact = coordinator.run(clip_request("u1")).await.unwrap();

    let calls = transcoder.calls();
    assert_eq!(calls.len(), 1);
    let (input, range) = &calls[0];
    assert_eq!(range.start.seconds, 10.0);
    assert_eq!(range.end.seconds, 20.0);
    assert!(input
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("raw-"));
    assert!(!input.exists());
    assert_eq!(harness.files(), vec![artifact.filename.clone()]);
}

#[tokio::test]
async fn test_trim_failure_removes_raw_and_output() {
    let harness = Harness::new();
    let extractor = Arc::new(StubExtractor::new(vec!["22"]));
    let transcoder = Arc::new(StubTranscoder::new(1));
    let coordinator = harness
        .coordinator(extractor.clone(), transcoder.clone(), LONG)
        .await;

    let result = coordinator.run(clip_request("u1")).await;

    assert!(matches!(result, Err(ClipCutError::TrimFailed { .. })));
    assert_eq!(transcoder.calls().len(), 1);
    assert!(harness.files().is_empty());
    assert!(coordinator
        .list_by_owner(&OwnerId::new("u1"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_end_to_end_clip() {
    let harness = Harness::new();
    let extractor = Arc::new(StubExtractor::new(vec!["22"]));
    let transcoder = Arc::new(StubTranscoder::new(0));
    let coordinator = harness
        .coordinator(extractor.clone(), transcoder.clone(), LONG)
        .await;

    let artifact = coordinator.run(clip_request("u1")).await.unwrap();

    assert!(artifact.filename.starts_with("snippet-"));
    assert!(artifact.filename.ends_with(".mp4"));
    assert_eq!(artifact.filename.len(), "snippet-".len() + 32 + ".mp4".len());
    assert_eq!(artifact.duration_label.as_deref(), Some("00:10"));
    assert_eq!(artifact.owner_id, OwnerId::new("u1"));
    assert_eq!(artifact.source_platform, "YouTube");
    assert_eq!(artifact.format, "MP4");
    assert_eq!(
        artifact.title,
        "Clip 00:10–00:20 from https://www.youtube.com/watch?v=abc"
    );
    assert!(harness.downloads.join(&artifact.filename).is_file());

    let listed = coordinator
        .list_by_owner(&OwnerId::new("u1"))
        .await
        .unwrap();
    assert_eq!(listed, vec![artifact.clone()]);
    assert_eq!(
        coordinator.get_by_filename(&artifact.filename).await.unwrap(),
        Some(artifact)
    );
}

#[tokio::test]
async fn test_concurrent_jobs_for_one_owner() {
    let harness = Harness::new();
    let extractor = Arc::new(StubExtractor::new(vec!["22"]).with_delay(Duration::from_millis(20)));
    let transcoder = Arc::new(StubTranscoder::new(0));
    let coordinator = harness
        .coordinator(extractor.clone(), transcoder.clone(), LONG)
        .await;

    let (a, b) = tokio::join!(
        coordinator.run(clip_request("u1")),
        coordinator.run(full_request("u1"))
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_ne!(a.filename, b.filename);

    let listed = coordinator
        .list_by_owner(&OwnerId::new("u1"))
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed[0].created_at >= listed[1].created_at);
    let names: HashSet<_> = listed.iter().map(|a| a.filename.clone()).collect();
    assert!(names.contains(&a.filename) && names.contains(&b.filename));
    assert_eq!(harness.files().len(), 2);
}

#[tokio::test]
async fn test_timeout_during_acquisition_leaves_no_files() {
    let harness = Harness::new();
    let extractor = Arc::new(StubExtractor::new(vec!["22"]).with_delay(Duration::from_secs(10)));
    let transcoder = Arc::new(StubTranscoder::new(0));
    let coordinator = harness
        .coordinator(extractor.clone(), transcoder.clone(), Duration::from_millis(100))
        .await;

    let result = coordinator.run(clip_request("u1")).await;

    match result {
        Err(ClipCutError::Timeout { stage, .. }) => assert_eq!(stage, JobStage::Acquiring),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(harness.files().is_empty());
}

#[tokio::test]
async fn test_timeout_during_trim_leaves_no_files() {
    let harness = Harness::new();
    let extractor = Arc::new(StubExtractor::new(vec!["22"]));
    let transcoder =
        Arc::new(StubTranscoder::new(0).with_delay(Duration::from_secs(10)));
    let coordinator = harness
        .coordinator(extractor.clone(), transcoder.clone(), Duration::from_millis(200))
        .await;

    let result = coordinator.run(clip_request("u1")).await;

    match result {
        Err(ClipCutError::Timeout { stage, .. }) => assert_eq!(stage, JobStage::Trimming),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(harness.files().is_empty());
}

#[tokio::test]
async fn test_persistence_failure_removes_output() {
    let harness = Harness::new();
    let extractor = Arc::new(StubExtractor::new(vec!["22"]));
    let transcoder = Arc::new(StubTranscoder::new(0));
    let coordinator =
        harness.coordinator_with_store(extractor, transcoder, Arc::new(FailingStore), LONG);

    let result = coordinator.run(clip_request("u1")).await;

    assert!(matches!(result, Err(ClipCutError::PersistenceFailed { .. })));
    assert!(harness.files().is_empty());
}

#[tokio::test]
async fn test_batch_preserves_order_and_bounds_concurrency() {
    let harness = Harness::new();
    let extractor = Arc::new(StubExtractor::new(vec!["22"]).with_delay(Duration::from_millis(50)));
    let transcoder = Arc::new(StubTranscoder::new(0));
    let coordinator = harness
        .coordinator(extractor.clone(), transcoder.clone(), LONG)
        .await;

    let requests = vec![
        full_request("u1"),
        clip_request("u2"),
        full_request("u3"),
        clip_request("u4"),
    ];
    let results = coordinator.run_batch(requests).await;

    assert_eq!(results.len(), 4);
    let owners: Vec<String> = results
        .iter()
        .map(|r| r.as_ref().unwrap().owner_id.to_string())
        .collect();
    assert_eq!(owners, vec!["u1", "u2", "u3", "u4"]);
    assert!(results[0].as_ref().unwrap().filename.starts_with("full-"));
    assert!(results[1].as_ref().unwrap().filename.starts_with("snippet-"));
    assert!(extractor.max_in_flight.load(Ordering::SeqCst) <= 2);
    assert_eq!(harness.files().len(), 4);
}
