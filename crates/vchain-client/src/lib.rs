//! Client for the remote video generation API.
//!
//! Layers, leaf first:
//! - [`transport`]: send one HTTP request with a browser header profile
//! - [`rate_limit`]: minimum spacing between outbound calls
//! - [`executor`]: credential check, permits, retries and classification
//! - [`poller`]: drives a submitted task to a terminal state
//! - [`client`]: domain operations (scope, upload, generate, delete, download)

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod executor;
pub mod headers;
pub mod metrics;
pub mod poller;
pub mod rate_limit;
pub mod transport;
pub mod types;

pub use client::{upload_etag, RemoteClient};
pub use config::ClientConfig;
pub use credential::Credential;
pub use error::{ClientError, ClientResult};
pub use executor::{Executor, RequestBody};
pub use headers::BrowserProfile;
pub use poller::{TaskPoller, TaskSource, UrlNormalizer};
pub use rate_limit::{Permit, RateLimiter};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse};
pub use types::UploadedAsset;
