//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use vchain_models::RejectionPolicy;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.runwayml.com/v1/";

/// Default web app origin, sent as `origin` and `referer`.
pub const DEFAULT_APP_ORIGIN: &str = "https://app.runwayml.com";

/// Default template for content-addressed artifact URLs. `{id}` is replaced
/// with the UUID found in the artifact URL.
pub const DEFAULT_ASSET_URL_TEMPLATE: &str = "https://dnznrvs05pmza.cloudfront.net/{id}.mp4";

/// Configuration for [`RemoteClient`](crate::RemoteClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL; relative request paths are joined onto it
    pub base_url: String,
    /// Web app origin for browser headers
    pub app_origin: String,
    /// Minimum spacing between two outbound calls
    pub min_interval: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Upstream proxy URL
    pub proxy: Option<String>,
    /// Keep cookies between requests
    pub cookie_jar: bool,
    /// Total attempts per request, including the first
    pub max_attempts: u32,
    /// Waits before successive transient-server retries; the last entry repeats
    pub backoff: Vec<Duration>,
    /// Delay between task polls
    pub poll_interval: Duration,
    /// Where failed responses are written for postmortem
    pub debug_dir: Option<PathBuf>,
    /// Classification of task rejections
    pub rejection_policy: RejectionPolicy,
    /// Template for content-addressed artifact URLs
    pub asset_url_template: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            app_origin: DEFAULT_APP_ORIGIN.to_string(),
            min_interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(120),
            proxy: None,
            cookie_jar: true,
            max_attempts: 3,
            backoff: vec![
                Duration::from_secs(30),
                Duration::from_secs(60),
                Duration::from_secs(120),
            ],
            poll_interval: Duration::from_secs(5),
            debug_dir: Some(std::env::temp_dir().join("vchain-debug")),
            rejection_policy: RejectionPolicy::default(),
            asset_url_template: Some(DEFAULT_ASSET_URL_TEMPLATE.to_string()),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the minimum interval between requests. Zero keeps the 1s default.
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.min_interval = interval;
        }
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn with_cookie_jar(mut self, enabled: bool) -> Self {
        self.cookie_jar = enabled;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: Vec<Duration>) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_debug_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.debug_dir = dir;
        self
    }

    pub fn with_rejection_policy(mut self, policy: RejectionPolicy) -> Self {
        self.rejection_policy = policy;
        self
    }

    pub fn with_asset_url_template(mut self, template: Option<String>) -> Self {
        self.asset_url_template = template;
        self
    }
}
