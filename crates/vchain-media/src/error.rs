//! Media errors.

use std::path::PathBuf;
use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("ffmpeg is not installed or not on PATH")]
    FfmpegNotFound,

    /// ffmpeg ran and exited unsuccessfully
    #[error("{message} (exit code {exit_code:?})")]
    FfmpegFailed {
        message: String,
        /// Last lines ffmpeg wrote to stderr
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("input file {0} does not exist")]
    FileNotFound(PathBuf),

    #[error("no segments to concatenate")]
    EmptyConcat,

    #[error("ffmpeg was cancelled")]
    Cancelled,

    #[error("ffmpeg did not finish within {0}s")]
    Timeout(u64),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl MediaError {
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
