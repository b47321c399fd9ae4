//! Remote client domain operations.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Method;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};
use vchain_models::{GenerateRequest, Gen3Size, Generation, ModelKind};

use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::error::{ClientError, ClientResult};
use crate::executor::{Executor, RequestBody};
use crate::poller::{TaskPoller, TaskSource, UrlNormalizer};
use crate::rate_limit::RateLimiter;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    CreateDatasetRequest, CreateDatasetResponse, CreateTaskRequest, DatasetType,
    DeleteAssetRequest, DeleteAssetResponse, Gen2Payload, Gen2TaskOptions, Gen3TaskOptions,
    ProfileResponse, Task, TaskOptions, TaskResponse, UploadCompleteRequest,
    UploadCompleteResponse, UploadKind, UploadPart, UploadRequest, UploadResponse, UploadedAsset,
};

/// Seeds are drawn from `0..SEED_RANGE`.
pub const SEED_RANGE: u32 = 1_000_000_000;

/// Part checksum sent when completing an upload: hex MD5 of the bytes.
pub fn upload_etag(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// Client for the remote generation service.
///
/// Holds the credential and lazily resolves the team scope once.
pub struct RemoteClient {
    executor: Executor,
    poller: TaskPoller,
    scope: OnceCell<u64>,
}

impl RemoteClient {
    /// Create a client with the default reqwest transport.
    pub fn new(token: &str, config: ClientConfig) -> ClientResult<Self> {
        let credential = Credential::parse(token)?;
        let transport = ReqwestTransport::new(
            config.request_timeout,
            config.proxy.as_deref(),
            config.cookie_jar,
        )?;
        Self::with_transport(credential, config, Arc::new(transport))
    }

    /// Create a client over any transport.
    pub fn with_transport(
        credential: Credential,
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> ClientResult<Self> {
        let executor = Executor::new(transport, credential, &config)?;
        let poller = TaskPoller::new(
            config.poll_interval,
            config.rejection_policy.clone(),
            UrlNormalizer::new(config.asset_url_template.clone())?,
        );
        Ok(Self {
            executor,
            poller,
            scope: OnceCell::new(),
        })
    }

    /// Share a rate limiter with other clients in the process.
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.executor = self.executor.with_rate_limiter(limiter);
        self
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Team scope: first organization of the profile, else the user id.
    /// Looked up at most once; concurrent first callers share the lookup.
    pub async fn resolve_scope(&self, cancel: &CancellationToken) -> ClientResult<u64> {
        self.scope
            .get_or_try_init(|| self.fetch_scope(cancel))
            .await
            .copied()
    }

    async fn fetch_scope(&self, cancel: &CancellationToken) -> ClientResult<u64> {
        let profile: ProfileResponse = self
            .executor
            .execute_json(Method::GET, "profile", RequestBody::Empty, cancel)
            .await?;
        let scope = profile.scope();
        debug!(scope, "Resolved team scope");
        Ok(scope)
    }

    /// Upload an image as a dataset and return its URL and asset id.
    ///
    /// Runs the three-step upload twice (primary and preview), then registers
    /// a dataset referencing both.
    pub async fn upload(
        &self,
        name: &str,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> ClientResult<UploadedAsset> {
        let span = info_span!("upload", name = %name, size = bytes.len());
        self.upload_inner(name, bytes, cancel).instrument(span).await
    }

    async fn upload_inner(
        &self,
        name: &str,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> ClientResult<UploadedAsset> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let etag = upload_etag(bytes);

        let mut upload_ids = Vec::with_capacity(2);
        let mut primary_url = None;
        for kind in [UploadKind::Dataset, UploadKind::DatasetPreview] {
            let (id, url) = self.upload_part(name, bytes, extension, kind, &etag, cancel).await?;
            if primary_url.is_none() {
                primary_url = Some(url);
            }
            upload_ids.push(id);
        }

        let scope = self.resolve_scope(cancel).await?;
        let request = CreateDatasetRequest {
            file_count: 1,
            name: name.to_string(),
            upload_id: upload_ids[0].clone(),
            preview_upload_ids: upload_ids[1..].to_vec(),
            kind: DatasetType::image(),
            as_team_id: scope,
        };
        let created: CreateDatasetResponse = self
            .executor
            .execute_json(Method::POST, "datasets", RequestBody::json(&request)?, cancel)
            .await?;
        if created.dataset.id.is_empty() {
            return Err(ClientError::invalid_response("empty dataset id"));
        }

        let url = primary_url.ok_or_else(|| ClientError::invalid_response("no upload URL"))?;
        info!(asset_id = %created.dataset.id, "Upload complete");
        Ok(UploadedAsset {
            id: created.dataset.id,
            url,
        })
    }

    async fn upload_part(
        &self,
        name: &str,
        bytes: &[u8],
        extension: &str,
        kind: UploadKind,
        etag: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<(String, String)> {
        let request = UploadRequest {
            filename: name.to_string(),
            number_of_parts: 1,
            kind,
        };
        let slot: UploadResponse = self
            .executor
            .execute_json(Method::POST, "uploads", RequestBody::json(&request)?, cancel)
            .await?;
        let upload_url = slot
            .upload_urls
            .first()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ClientError::invalid_response("no upload URLs returned"))?;
        if slot.id.is_empty() {
            return Err(ClientError::invalid_response("empty upload id"));
        }

        self.executor
            .execute(
                Method::PUT,
                upload_url,
                RequestBody::upload(bytes.to_vec(), extension),
                cancel,
            )
            .await?;

        let complete = UploadCompleteRequest {
            parts: vec![UploadPart {
                part_number: 1,
                etag: etag.to_string(),
            }],
        };
        let completed: UploadCompleteResponse = self
            .executor
            .execute_json(
                Method::POST,
                &format!("uploads/{}/complete", slot.id),
                RequestBody::json(&complete)?,
                cancel,
            )
            .await?;
        if completed.url.is_empty() {
            return Err(ClientError::invalid_response(format!(
                "empty URL for {:?} upload",
                kind
            )));
        }
        debug!(upload_id = %slot.id, url = %completed.url, "Upload part complete");
        Ok((slot.id, completed.url))
    }

    /// Submit a generation task and wait for it to finish.
    pub async fn submit_and_await_generation(
        &self,
        request: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<Generation> {
        let scope = self.resolve_scope(cancel).await?;
        let seed: u32 = rand::rng().random_range(0..SEED_RANGE);
        let payload = build_task_request(request, seed, scope);

        let span = info_span!(
            "generation",
            model = %request.model.family(),
            seed,
            continuation = request.input.is_continuation()
        );
        self.submit_inner(&payload, scope, cancel)
            .instrument(span)
            .await
    }

    async fn submit_inner(
        &self,
        payload: &CreateTaskRequest,
        scope: u64,
        cancel: &CancellationToken,
    ) -> ClientResult<Generation> {
        let created: TaskResponse = self
            .executor
            .execute_json(Method::POST, "tasks", RequestBody::json(payload)?, cancel)
            .await?;
        info!(task_id = %created.task.id, name = %created.task.name, "Task created");
        self.poller
            .await_completion(self, created.task, scope, cancel)
            .await
    }

    /// Delete an uploaded asset.
    pub async fn delete_asset(&self, id: &str, cancel: &CancellationToken) -> ClientResult<()> {
        let resp: DeleteAssetResponse = self
            .executor
            .execute_json(
                Method::DELETE,
                &format!("assets/{}", id),
                RequestBody::json(&DeleteAssetRequest::default())?,
                cancel,
            )
            .await?;
        if !resp.success {
            return Err(ClientError::invalid_response(format!(
                "asset {} was not deleted",
                id
            )));
        }
        debug!(asset_id = %id, "Asset deleted");
        Ok(())
    }

    /// Download an artifact to `path`. Returns the number of bytes written.
    pub async fn download(
        &self,
        url: &str,
        path: &Path,
        cancel: &CancellationToken,
    ) -> ClientResult<u64> {
        let bytes = self
            .executor
            .execute(Method::GET, url, RequestBody::Empty, cancel)
            .await?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, &bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "Downloaded artifact");
        Ok(bytes.len() as u64)
    }
}

#[async_trait]
impl TaskSource for RemoteClient {
    async fn fetch_task(
        &self,
        task_id: &str,
        scope: u64,
        cancel: &CancellationToken,
    ) -> ClientResult<Task> {
        let resp: TaskResponse = self
            .executor
            .execute_json(
                Method::GET,
                &format!("tasks/{}?asTeamId={}", task_id, scope),
                RequestBody::Empty,
                cancel,
            )
            .await?;
        Ok(resp.task)
    }
}

/// Build the model-specific task payload.
pub fn build_task_request(request: &GenerateRequest, seed: u32, scope: u64) -> CreateTaskRequest {
    let name = request.task_name(seed);
    let asset_group_name = request.asset_group();
    let image = request.input.image_url().map(str::to_string);
    let video = request.input.video_url().map(str::to_string);
    let seconds = request.model.seconds();

    let options = match &request.model {
        ModelKind::Gen2(opts) => TaskOptions::Gen2(Gen2TaskOptions {
            seconds,
            gen2_options: Gen2Payload {
                mode: "gen2".to_string(),
                seed,
                interpolate: opts.interpolate,
                upscale: opts.upscale,
                watermark: opts.watermark,
                text_prompt: request.prompt.clone(),
                image_prompt: image.clone(),
                init_image: image,
                init_video: video,
                motion_score: opts.motion_score,
                use_motion_score: true,
                use_motion_vectors: false,
                width: opts.width,
                height: opts.height,
            },
            name,
            asset_group_name,
            explore_mode: request.explore_mode,
        }),
        ModelKind::Gen3(opts) => {
            let (width, height, resolution) = match &opts.size {
                Gen3Size::Pixels { width, height } => (Some(*width), Some(*height), None),
                Gen3Size::Resolution(tier) => (None, None, Some(tier.clone())),
            };
            let image_as_end_frame = opts.last_frame && image.is_some();
            TaskOptions::Gen3(Gen3TaskOptions {
                name,
                seconds,
                text_prompt: request.prompt.clone(),
                seed,
                explore_mode: request.explore_mode,
                watermark: opts.watermark,
                enhance_prompt: true,
                init_image: image,
                init_video: video,
                image_as_end_frame,
                width,
                height,
                resolution,
                asset_group_name,
            })
        }
    };

    CreateTaskRequest {
        task_type: request.model.task_type().to_string(),
        internal: false,
        options,
        as_team_id: scope,
    }
}
