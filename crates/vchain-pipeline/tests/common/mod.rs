//! Fakes for the remote service and the splicer.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use vchain_client::{ClientError, ClientResult, UploadedAsset};
use vchain_media::{MediaResult, Splicer};
use vchain_models::{GenerateRequest, Generation, RejectionPolicy, TaskFailure};
use vchain_pipeline::GenerationService;

/// Number of `.mp4` files currently in `dir`.
pub fn mp4_count(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.path().extension().is_some_and(|x| x == "mp4"))
                .count()
        })
        .unwrap_or(0)
}

#[derive(Default)]
pub struct FakeService {
    pub work_dir: PathBuf,
    pub uploads: Mutex<Vec<(String, Vec<u8>)>>,
    pub requests: Mutex<Vec<GenerateRequest>>,
    pub downloads: Mutex<Vec<(String, PathBuf)>>,
    pub deleted: Mutex<Vec<String>>,
    pub peak_segments: Mutex<usize>,
    /// 1-based generation number that fails with a policy rejection
    pub reject_generation: Option<usize>,
}

impl FakeService {
    pub fn new(work_dir: &Path) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            ..Default::default()
        }
    }

    pub fn rejecting(mut self, generation: usize) -> Self {
        self.reject_generation = Some(generation);
        self
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn generation_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn download_count(&self) -> usize {
        self.downloads.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationService for FakeService {
    async fn upload(
        &self,
        name: &str,
        bytes: &[u8],
        _cancel: &CancellationToken,
    ) -> ClientResult<UploadedAsset> {
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((name.to_string(), bytes.to_vec()));
        let n = uploads.len();
        Ok(UploadedAsset {
            id: format!("asset-{}", n),
            url: format!("https://uploads.test/{}", name),
        })
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<Generation> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        let n = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        if self.reject_generation == Some(n) {
            let reason = Some("SAFETY.INPUT.IMAGE".to_string());
            return Err(ClientError::TaskRejected(TaskFailure {
                task_id: format!("task-{}", n),
                status: "FAILED".to_string(),
                message: Some("blocked".to_string()),
                class: RejectionPolicy::default().classify(reason.as_deref()),
                reason,
                moderation_category: None,
            }));
        }
        Ok(Generation {
            task_id: format!("task-{}", n),
            url: format!("https://cdn.test/gen-{}.mp4", n),
            normalized_url: None,
            preview_urls: vec![],
        })
    }

    async fn delete_asset(&self, id: &str, cancel: &CancellationToken) -> ClientResult<()> {
        assert!(!cancel.is_cancelled(), "cleanup must not inherit cancellation");
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn download(&self, url: &str, path: &Path, _cancel: &CancellationToken) -> ClientResult<u64> {
        tokio::fs::write(path, url.as_bytes()).await?;
        self.downloads
            .lock()
            .unwrap()
            .push((url.to_string(), path.to_path_buf()));
        let mut peak = self.peak_segments.lock().unwrap();
        *peak = (*peak).max(mp4_count(&self.work_dir));
        Ok(url.len() as u64)
    }
}

#[derive(Default)]
pub struct FakeSplicer {
    pub frames: Mutex<Vec<(PathBuf, PathBuf)>>,
    pub reversed: Mutex<Vec<PathBuf>>,
    pub manifests: Mutex<Vec<String>>,
}

impl FakeSplicer {
    pub fn frame_count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }
}

#[async_trait]
impl Splicer for FakeSplicer {
    async fn extract_last_frame(&self, input: &Path, output: &Path) -> MediaResult<()> {
        assert!(input.exists(), "{} should exist", input.display());
        tokio::fs::write(output, b"jpeg").await?;
        self.frames
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf()));
        Ok(())
    }

    async fn reverse(&self, input: &Path, output: &Path) -> MediaResult<()> {
        tokio::fs::copy(input, output).await?;
        self.reversed.lock().unwrap().push(output.to_path_buf());
        Ok(())
    }

    async fn concat_manifest(&self, manifest: &Path, output: &Path) -> MediaResult<()> {
        let listing = tokio::fs::read_to_string(manifest).await?;
        tokio::fs::write(output, listing.as_bytes()).await?;
        self.manifests.lock().unwrap().push(listing);
        Ok(())
    }
}
