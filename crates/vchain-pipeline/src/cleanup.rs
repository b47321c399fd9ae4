//! Scoped cleanup of working files and uploaded assets.
//!
//! Both guards are created before the resources they own and register each
//! resource as soon as it exists. Every exit path, cancellation included,
//! releases what was created so far.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vchain_media::fs_utils::{remove_best_effort, remove_best_effort_sync};

use crate::service::GenerationService;

/// Local working files, removed on [`remove_all`](Self::remove_all) or drop.
#[derive(Debug, Default)]
pub struct TempFiles {
    paths: Vec<PathBuf>,
}

impl TempFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `path` and hand it back.
    pub fn track(&mut self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        self.paths.push(path.clone());
        path
    }

    /// Remove one tracked file now.
    pub async fn remove(&mut self, path: &Path) -> bool {
        self.paths.retain(|p| p != path);
        remove_best_effort(path).await
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Remove every tracked file. Failures are logged, never raised.
    pub async fn remove_all(&mut self) {
        for path in std::mem::take(&mut self.paths) {
            if remove_best_effort(&path).await {
                debug!("Removed {}", path.display());
            }
        }
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            remove_best_effort_sync(&path);
        }
    }
}

/// Uploaded assets to delete when a workflow returns.
///
/// Each deletion runs under its own deadline with a fresh cancellation
/// token, so it still happens after the workflow itself was cancelled.
pub struct AssetCleanup<'a> {
    service: &'a dyn GenerationService,
    timeout: Duration,
    ids: Vec<String>,
}

impl<'a> AssetCleanup<'a> {
    pub fn new(service: &'a dyn GenerationService, timeout: Duration) -> Self {
        Self {
            service,
            timeout,
            ids: Vec::new(),
        }
    }

    pub fn register(&mut self, id: impl Into<String>) {
        self.ids.push(id.into());
    }

    pub fn pending(&self) -> &[String] {
        &self.ids
    }

    /// Delete every registered asset, most recent first.
    pub async fn run(mut self) {
        for id in std::mem::take(&mut self.ids).into_iter().rev() {
            let cancel = CancellationToken::new();
            match tokio::time::timeout(self.timeout, self.service.delete_asset(&id, &cancel)).await {
                Ok(Ok(())) => debug!(asset_id = %id, "Deleted uploaded asset"),
                Ok(Err(e)) => warn!(asset_id = %id, "Couldn't delete asset: {}", e),
                Err(_) => {
                    cancel.cancel();
                    warn!(
                        asset_id = %id,
                        timeout_secs = self.timeout.as_secs(),
                        "Timed out deleting asset"
                    );
                }
            }
        }
    }
}

impl Drop for AssetCleanup<'_> {
    fn drop(&mut self) {
        if !self.ids.is_empty() {
            warn!(assets = ?self.ids, "Uploaded assets were not deleted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;
    use vchain_client::{ClientError, ClientResult, UploadedAsset};
    use vchain_models::{GenerateRequest, Generation};

    #[derive(Default)]
    struct DeleteRecorder {
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GenerationService for DeleteRecorder {
        async fn upload(&self, _: &str, _: &[u8], _: &CancellationToken) -> ClientResult<UploadedAsset> {
            unreachable!()
        }

        async fn generate(&self, _: &GenerateRequest, _: &CancellationToken) -> ClientResult<Generation> {
            unreachable!()
        }

        async fn delete_asset(&self, id: &str, _: &CancellationToken) -> ClientResult<()> {
            self.deleted.lock().unwrap().push(id.to_string());
            match id {
                "hangs" => std::future::pending().await,
                "fails" => Err(ClientError::invalid_response("not deleted")),
                _ => Ok(()),
            }
        }

        async fn download(&self, _: &str, _: &Path, _: &CancellationToken) -> ClientResult<u64> {
            unreachable!()
        }
    }

    #[test]
    fn test_drop_removes_tracked_files() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.mp4");
        std::fs::write(&a, b"a").unwrap();
        {
            let mut files = TempFiles::new();
            files.track(&a);
            files.track(dir.path().join("never-created.jpg"));
        }
        assert!(!a.exists());
    }

    #[tokio::test]
    async fn test_remove_untracks() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.jpg");
        std::fs::write(&a, b"a").unwrap();

        let mut files = TempFiles::new();
        let tracked = files.track(&a);
        assert!(files.remove(&tracked).await);
        assert!(files.paths().is_empty());
        assert!(!a.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_asset_cleanup_survives_failures_and_hangs() {
        let service = DeleteRecorder::default();
        let mut assets = AssetCleanup::new(&service, Duration::from_secs(15));
        assets.register("first");
        assets.register("hangs");
        assets.register("fails");
        assert_eq!(assets.pending(), ["first", "hangs", "fails"]);

        let start = tokio::time::Instant::now();
        assets.run().await;

        assert_eq!(*service.deleted.lock().unwrap(), vec!["fails", "hangs", "first"]);
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }
}
