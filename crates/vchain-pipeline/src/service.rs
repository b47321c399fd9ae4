//! The remote operations a chain depends on.

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use vchain_client::{ClientResult, RemoteClient, UploadedAsset};
use vchain_models::{GenerateRequest, Generation};

/// Upload, generate, delete and download, as seen by the workflows.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn upload(
        &self,
        name: &str,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> ClientResult<UploadedAsset>;

    /// Submit a generation and wait for its terminal state.
    async fn generate(
        &self,
        request: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<Generation>;

    async fn delete_asset(&self, id: &str, cancel: &CancellationToken) -> ClientResult<()>;

    /// Fetch an artifact to `path`; returns the bytes written.
    async fn download(&self, url: &str, path: &Path, cancel: &CancellationToken) -> ClientResult<u64>;
}

#[async_trait]
impl GenerationService for RemoteClient {
    async fn upload(
        &self,
        name: &str,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> ClientResult<UploadedAsset> {
        RemoteClient::upload(self, name, bytes, cancel).await
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<Generation> {
        self.submit_and_await_generation(request, cancel).await
    }

    async fn delete_asset(&self, id: &str, cancel: &CancellationToken) -> ClientResult<()> {
        RemoteClient::delete_asset(self, id, cancel).await
    }

    async fn download(&self, url: &str, path: &Path, cancel: &CancellationToken) -> ClientResult<u64> {
        RemoteClient::download(self, url, path, cancel).await
    }
}
