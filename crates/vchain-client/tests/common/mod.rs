//! Shared test doubles.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::HeaderMap;
use tokio::time::Instant;
use vchain_client::{ClientConfig, Credential, Transport, TransportError, TransportRequest, TransportResponse};

pub type Scripted = Result<TransportResponse, TransportError>;

/// Transport that replays scripted responses in order and records every call.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<(Instant, TransportRequest)>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.calls.lock().unwrap().iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    /// Gaps between consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        self.call_times().windows(2).map(|w| w[1] - w[0]).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.calls.lock().unwrap().push((Instant::now(), request));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("script exhausted".into())))
    }
}

pub fn respond(status: u16, body: &str) -> Scripted {
    Ok(TransportResponse {
        status,
        headers: HeaderMap::new(),
        body: body.as_bytes().to_vec(),
    })
}

pub fn ok_json(body: serde_json::Value) -> Scripted {
    respond(200, &body.to_string())
}

pub fn timeout() -> Scripted {
    Err(TransportError::Timeout("operation timed out".into()))
}

pub fn valid_credential() -> Credential {
    Credential::from_parts("test-token", Utc::now() + chrono::Duration::hours(1))
}

pub fn expired_credential() -> Credential {
    Credential::from_parts("test-token", Utc::now() - chrono::Duration::seconds(1))
}

pub fn test_config() -> ClientConfig {
    ClientConfig::default()
        .with_base_url("https://api.test/v1/")
        .with_debug_dir(None)
        .with_asset_url_template(None)
}

pub fn profile_json(scope: u64) -> serde_json::Value {
    serde_json::json!({ "user": { "id": 1, "organizations": [{ "id": scope }] } })
}

pub fn task_json(id: &str, status: &str) -> serde_json::Value {
    serde_json::json!({ "task": { "id": id, "status": status, "progressRatio": "0.5" } })
}

pub fn succeeded_json(id: &str, url: &str) -> serde_json::Value {
    serde_json::json!({
        "task": {
            "id": id,
            "status": "SUCCEEDED",
            "artifacts": [{ "id": "a1", "url": url, "previewUrls": ["https://p.test/1.jpg"] }]
        }
    })
}
