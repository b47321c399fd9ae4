//! HTTP transport capability.
//!
//! The executor only needs "send a request, get status, headers and body".
//! [`ReqwestTransport`] is the default implementation; anything able to
//! present a browser-like TLS fingerprint can be plugged in instead.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Proxy};
use thiserror::Error;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// One outbound request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Failure before a complete response was read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(_) | TransportError::Connect(_) => {
                ClientError::TransientTransport(err.to_string())
            }
            TransportError::Other(msg) => ClientError::Transport(msg),
        }
    }
}

/// Sends a single HTTP request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by reqwest with rustls.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Create a transport with a total request timeout, optional proxy and
    /// optional cookie jar.
    pub fn new(timeout: Duration, proxy: Option<&str>, cookie_jar: bool) -> ClientResult<Self> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .cookie_store(cookie_jar);

        if let Some(proxy) = proxy {
            let proxy = Proxy::all(proxy)
                .map_err(|e| ClientError::config(format!("invalid proxy {}: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }

        let http = builder
            .build()
            .map_err(|e| ClientError::config(format!("couldn't build HTTP client: {}", e)))?;
        Ok(Self { http })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(classify)?.to_vec();

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_and_connect_are_transient() {
        let err: ClientError = TransportError::Timeout("slow".into()).into();
        assert!(err.is_retryable());
        let err: ClientError = TransportError::Connect("refused".into()).into();
        assert!(err.is_retryable());
        let err: ClientError = TransportError::Other("bad".into()).into();
        assert!(!err.is_retryable());
    }
}
