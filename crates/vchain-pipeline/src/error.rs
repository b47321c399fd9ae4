//! Pipeline error types.

use thiserror::Error;
use vchain_client::ClientError;
use vchain_media::MediaError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Remote error: {0}")]
    Client(#[from] ClientError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            PipelineError::Client(e) => e.is_cancelled(),
            PipelineError::Media(e) => e.is_cancelled(),
            _ => false,
        }
    }

    /// The chain was stopped by a content policy rejection.
    pub fn is_policy_rejection(&self) -> bool {
        matches!(self, PipelineError::Client(e) if e.is_policy_rejection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_seen_through_wrappers() {
        assert!(PipelineError::from(ClientError::Cancelled).is_cancelled());
        assert!(PipelineError::from(MediaError::Cancelled).is_cancelled());
        assert!(!PipelineError::invalid_input("x").is_cancelled());
    }
}
