//! Resilient request executor.
//!
//! Every physical attempt takes a rate-limit permit. Transport timeouts are
//! retried at once; a fixed set of server statuses is retried after an
//! escalating backoff; anything else fails immediately.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::error::{truncate_body, ClientError, ClientResult};
use crate::headers::BrowserProfile;
use crate::metrics::{record_request, record_retry};
use crate::rate_limit::RateLimiter;
use crate::transport::{Transport, TransportRequest};

/// The only status treated as success.
const SUCCESS_STATUS: u16 = 200;

/// Request payload.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    /// JSON-encoded body, sent with the bearer credential
    Json(Vec<u8>),
    /// Binary upload, sent cross-origin without credential
    Upload { bytes: Vec<u8>, content_type: String },
}

impl RequestBody {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> ClientResult<Self> {
        Ok(Self::Json(serde_json::to_vec(value)?))
    }

    /// Binary upload with a content type derived from the file extension.
    pub fn upload(bytes: Vec<u8>, extension: &str) -> Self {
        Self::Upload {
            bytes,
            content_type: upload_content_type(extension),
        }
    }

    fn bytes(&self) -> Option<&[u8]> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Json(bytes) | RequestBody::Upload { bytes, .. } => Some(bytes),
        }
    }

    fn preview(&self) -> String {
        match self {
            RequestBody::Empty => String::new(),
            RequestBody::Json(bytes) => truncate_body(&String::from_utf8_lossy(bytes)),
            RequestBody::Upload { bytes, content_type } => {
                format!("<{} bytes of {}>", bytes.len(), content_type)
            }
        }
    }
}

/// Image content type for an upload; `jpg` is normalised to `jpeg`.
pub fn upload_content_type(extension: &str) -> String {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    let ext = match ext.as_str() {
        "jpg" | "" => "jpeg",
        other => other,
    };
    format!("image/{}", ext)
}

fn is_absolute(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

/// Metric/log label: method plus first path segment, or host for absolute URLs.
fn operation_name(method: &Method, target: &str, url: &Url) -> String {
    let label = if is_absolute(target) {
        url.host_str().unwrap_or("external").to_string()
    } else {
        target
            .split(['/', '?'])
            .next()
            .unwrap_or(target)
            .to_string()
    };
    format!("{} {}", method, label)
}

/// Wraps a [`Transport`] with credential checks, rate limiting and retries.
pub struct Executor {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    credential: Credential,
    profile: BrowserProfile,
    base_url: Url,
    max_attempts: u32,
    backoff: Vec<Duration>,
    debug_dir: Option<PathBuf>,
}

impl Executor {
    pub fn new(
        transport: Arc<dyn Transport>,
        credential: Credential,
        config: &ClientConfig,
    ) -> ClientResult<Self> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| ClientError::config(format!("invalid base URL {}: {}", base, e)))?;

        Ok(Self {
            transport,
            limiter: Arc::new(RateLimiter::new(config.min_interval)),
            credential,
            profile: BrowserProfile::chrome_126(config.app_origin.clone()),
            base_url,
            max_attempts: config.max_attempts.max(1),
            backoff: config.backoff.clone(),
            debug_dir: config.debug_dir.clone(),
        })
    }

    /// Share a limiter with other executors in the process.
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_profile(mut self, profile: BrowserProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Backoff before the retry that follows failed attempt `attempt` (1-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if self.backoff.is_empty() {
            return Duration::ZERO;
        }
        let idx = (attempt.saturating_sub(1) as usize).min(self.backoff.len() - 1);
        self.backoff[idx]
    }

    /// Resolve a relative API path or pass an absolute URL through.
    pub fn resolve(&self, target: &str) -> ClientResult<Url> {
        let parsed = if is_absolute(target) {
            Url::parse(target)
        } else {
            self.base_url.join(target.trim_start_matches('/'))
        };
        parsed.map_err(|e| ClientError::config(format!("invalid URL {}: {}", target, e)))
    }

    /// Execute a request and return the raw response body.
    pub async fn execute(
        &self,
        method: Method,
        target: &str,
        body: RequestBody,
        cancel: &CancellationToken,
    ) -> ClientResult<Vec<u8>> {
        self.credential.ensure_valid()?;

        let url = self.resolve(target)?;
        let operation = operation_name(&method, target, &url);
        let headers = match &body {
            RequestBody::Upload {
                bytes,
                content_type,
            } => self.profile.upload_headers(content_type, bytes.len())?,
            _ if is_absolute(target) => self.profile.external_headers(&url)?,
            _ => self.profile.api_headers(self.credential.token())?,
        };

        debug!(operation = %operation, "do {} {} {}", method, url, body.preview());

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let err = match self
                .attempt(&operation, &method, &url, &headers, &body, cancel)
                .await
            {
                Ok(bytes) => return Ok(bytes),
                Err(e) => e,
            };

            if !err.is_retryable() || attempt >= self.max_attempts {
                return Err(err);
            }

            record_retry(&operation);

            if err.needs_backoff() {
                let wait = self.backoff_delay(attempt);
                warn!(
                    operation = %operation,
                    attempt,
                    wait_secs = wait.as_secs(),
                    "Server seems to be down, waiting before retrying: {}",
                    err
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                    _ = tokio::time::sleep(wait) => {}
                }
            } else {
                warn!(operation = %operation, attempt, "Retrying immediately: {}", err);
            }
        }
    }

    /// Execute a request and decode the JSON response.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        method: Method,
        target: &str,
        body: RequestBody,
        cancel: &CancellationToken,
    ) -> ClientResult<T> {
        let bytes = self.execute(method, target, body, cancel).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.capture(&bytes).await;
                Err(ClientError::invalid_response(format!(
                    "couldn't decode {} response: {}",
                    target, e
                )))
            }
        }
    }

    /// One physical attempt, holding a permit until the body is read.
    async fn attempt(
        &self,
        operation: &str,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: &RequestBody,
        cancel: &CancellationToken,
    ) -> ClientResult<Vec<u8>> {
        let _permit = self.limiter.acquire(cancel).await?;

        let request = TransportRequest {
            method: method.clone(),
            url: url.clone(),
            headers: headers.clone(),
            body: body.bytes().map(<[u8]>::to_vec),
        };

        let start = Instant::now();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            result = self.transport.send(request) => result,
        };
        let latency = start.elapsed();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                record_request(operation, 0, latency);
                return Err(e.into());
            }
        };
        record_request(operation, response.status, latency);

        let text = String::from_utf8_lossy(&response.body);
        debug!(
            operation = %operation,
            status = response.status,
            "response {}",
            truncate_body(&text)
        );

        if response.status != SUCCESS_STATUS {
            self.capture(&response.body).await;
            return Err(ClientError::from_http_status(response.status, &text));
        }
        Ok(response.body)
    }

    /// Persist a failed body for postmortem. Never fails the request.
    async fn capture(&self, body: &[u8]) {
        let Some(dir) = &self.debug_dir else {
            return;
        };
        let id = Uuid::new_v4().simple().to_string();
        let path = dir.join(format!(
            "debug_{}_{}.json",
            Utc::now().format("%Y%m%d_%H%M%S"),
            &id[..8]
        ));
        match write_capture(dir, &path, body).await {
            Ok(()) => debug!("Wrote debug capture {}", path.display()),
            Err(e) => warn!("Couldn't write debug capture {}: {}", path.display(), e),
        }
    }
}

async fn write_capture(dir: &Path, path: &Path, body: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(path, body).await
}
