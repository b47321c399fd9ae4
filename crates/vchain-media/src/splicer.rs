//! The splicer capability: last-frame extraction, reversing and
//! re-encode-free concatenation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::manifest::ConcatManifest;

/// Media operations the chain workflows depend on.
///
/// Concatenation requires every clip to share encoding parameters.
#[async_trait]
pub trait Splicer: Send + Sync {
    /// Write the final frame of `input` as a still image.
    async fn extract_last_frame(&self, input: &Path, output: &Path) -> MediaResult<()>;

    /// Write `input` played backwards.
    async fn reverse(&self, input: &Path, output: &Path) -> MediaResult<()>;

    /// Concatenate the clips listed in a manifest file, without re-encoding.
    async fn concat_manifest(&self, manifest: &Path, output: &Path) -> MediaResult<()>;

    /// Concatenate clips in order, without re-encoding.
    ///
    /// Writes a temporary manifest that is removed when done.
    async fn concatenate(&self, inputs: &[&Path], output: &Path) -> MediaResult<()> {
        if inputs.is_empty() {
            return Err(MediaError::EmptyConcat);
        }
        let list = tempfile::Builder::new()
            .prefix("concat-")
            .suffix(".txt")
            .tempfile()?;
        ConcatManifest::from_paths(inputs).write(list.path()).await?;
        self.concat_manifest(list.path(), output).await
    }
}

/// [`Splicer`] backed by the ffmpeg binary.
#[derive(Debug, Clone, Default)]
pub struct FfmpegSplicer {
    runner: FfmpegRunner,
}

impl FfmpegSplicer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.runner = self.runner.with_cancel(cancel);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.runner = self.runner.with_timeout(timeout);
        self
    }

    async fn run(&self, input: &Path, cmd: FfmpegCommand) -> MediaResult<()> {
        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return Err(MediaError::FileNotFound(input.to_path_buf()));
        }
        self.runner.run(&cmd).await?;
        debug!("Wrote {}", cmd.output().display());
        Ok(())
    }
}

#[async_trait]
impl Splicer for FfmpegSplicer {
    async fn extract_last_frame(&self, input: &Path, output: &Path) -> MediaResult<()> {
        let cmd = FfmpegCommand::new(input, output)
            .seek_from_end(1.0)
            .update_single_image()
            .image_quality(1);
        self.run(input, cmd).await
    }

    async fn reverse(&self, input: &Path, output: &Path) -> MediaResult<()> {
        let cmd = FfmpegCommand::new(input, output).video_filter("reverse");
        self.run(input, cmd).await
    }

    async fn concat_manifest(&self, manifest: &Path, output: &Path) -> MediaResult<()> {
        let cmd = FfmpegCommand::new(manifest, output)
            .concat_demuxer()
            .stream_copy()
            .output_args(["-fflags", "+bitexact"]);
        self.run(manifest, cmd).await
    }
}
