//! Client error types.

use chrono::{DateTime, Utc};
use thiserror::Error;
use vchain_models::{TaskFailure, TaskFailureClass};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Maximum number of response body characters kept in an error.
pub const ERROR_BODY_CHARS: usize = 100;

/// Status codes that are retried after a backoff wait.
pub const BACKOFF_RETRY_STATUSES: [u16; 6] = [429, 500, 502, 504, 520, 522];

/// Errors that can occur while talking to the remote service.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Credential expired at {0}")]
    CredentialExpired(DateTime<Utc>),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Transient transport error: {0}")]
    TransientTransport(String),

    #[error("Server error {status}: {body}")]
    TransientServer { status: u16, body: String },

    #[error("Request failed with status {status}: {body}")]
    PermanentRequest { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Task rejected: {0}")]
    TaskRejected(TaskFailure),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn invalid_credential(msg: impl Into<String>) -> Self {
        Self::InvalidCredential(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an error from a non-success HTTP status and its body.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        let body = truncate_body(body);
        if BACKOFF_RETRY_STATUSES.contains(&status) {
            Self::TransientServer { status, body }
        } else {
            Self::PermanentRequest { status, body }
        }
    }

    /// Check if the executor may retry this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::TransientTransport(_) | ClientError::TransientServer { .. }
        )
    }

    /// Check if the retry must wait for a backoff delay first.
    pub fn needs_backoff(&self) -> bool {
        matches!(self, ClientError::TransientServer { .. })
    }

    /// Task was rejected by a content policy. Never resubmit.
    pub fn is_policy_rejection(&self) -> bool {
        matches!(self, ClientError::TaskRejected(f) if f.class == TaskFailureClass::Policy)
    }

    /// Task failed in a way the caller may resubmit.
    pub fn is_resubmittable(&self) -> bool {
        matches!(self, ClientError::TaskRejected(f) if f.class == TaskFailureClass::Transient)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }

    /// HTTP status carried by the error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::TransientServer { status, .. }
            | ClientError::PermanentRequest { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Truncate a response body for error messages and logs.
pub fn truncate_body(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(ERROR_BODY_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status_backoff_set() {
        for status in BACKOFF_RETRY_STATUSES {
            let err = ClientError::from_http_status(status, "down");
            assert!(err.is_retryable(), "{} should be retryable", status);
            assert!(err.needs_backoff());
        }
    }

    #[test]
    fn test_from_http_status_permanent() {
        for status in [400, 401, 403, 404, 503] {
            let err = ClientError::from_http_status(status, "nope");
            assert!(matches!(err, ClientError::PermanentRequest { .. }));
            assert!(!err.is_retryable());
            assert_eq!(err.http_status(), Some(status));
        }
    }

    #[test]
    fn test_body_truncated_to_limit() {
        let body = "x".repeat(250);
        let err = ClientError::from_http_status(400, &body);
        match err {
            ClientError::PermanentRequest { body, .. } => {
                assert_eq!(body.len(), ERROR_BODY_CHARS + 3);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn test_transport_timeout_retries_without_backoff() {
        let err = ClientError::TransientTransport("timed out".into());
        assert!(err.is_retryable());
        assert!(!err.needs_backoff());
    }
}
