//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// Number of stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// ffmpeg's `-v` level; only errors reach stderr.
const LOG_LEVEL: &str = "error";

/// One ffmpeg invocation: a single input, a single output, and the
/// options placed before and after `-i`. The output is always overwritten.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    pre_input: Vec<String>,
    post_input: Vec<String>,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            pre_input: Vec::new(),
            post_input: Vec::new(),
        }
    }

    /// Options applied to the input (placed before `-i`).
    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pre_input.extend(args.into_iter().map(Into::into));
        self
    }

    /// Options applied to the output (placed after `-i`).
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post_input.extend(args.into_iter().map(Into::into));
        self
    }

    /// Start reading `seconds` before the end of the input.
    pub fn seek_from_end(self, seconds: f64) -> Self {
        self.input_args(["-sseof".to_string(), format!("-{}", seconds)])
    }

    /// Treat the input as a concat demuxer list with absolute paths allowed.
    pub fn concat_demuxer(self) -> Self {
        self.input_args(["-f", "concat", "-safe", "0"])
    }

    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_args(["-vf".to_string(), filter.into()])
    }

    /// Remux every stream as is.
    pub fn stream_copy(self) -> Self {
        self.output_args(["-c", "copy"])
    }

    /// Keep rewriting one image file, leaving the last decoded frame.
    pub fn update_single_image(self) -> Self {
        self.output_args(["-update", "1"])
    }

    /// JPEG quality scale, 1 is best.
    pub fn image_quality(self, q: u8) -> Self {
        self.output_args(["-q:v".to_string(), q.to_string()])
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Full argument list, without the program name.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec!["-y".to_string(), "-v".to_string(), LOG_LEVEL.to_string()];
        args.extend(self.pre_input.iter().cloned());
        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().into_owned());
        args.extend(self.post_input.iter().cloned());
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Spawns ffmpeg and waits for it, killing the process on cancellation or
/// when the optional deadline passes.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    cancel: Option<CancellationToken>,
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Deadline for one invocation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run `cmd` to completion. A failed run carries the stderr tail.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let program = check_ffmpeg()?;

        let args = cmd.build_args();
        debug!(output = %cmd.output().display(), "ffmpeg {}", args.join(" "));

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("stderr not captured"))?;
        let tail_handle = tokio::spawn(collect_tail(stderr));

        let waited = self.wait(&mut child).await;
        let tail = tail_handle.await.unwrap_or_default();

        let status = waited?;
        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                format!("ffmpeg failed writing {}", cmd.output().display()),
                Some(tail).filter(|t| !t.is_empty()),
                status.code(),
            ))
        }
    }

    async fn wait(&self, child: &mut Child) -> MediaResult<ExitStatus> {
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let deadline = async {
            match self.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            status = child.wait() => Ok(status?),
            _ = cancelled => {
                info!("ffmpeg cancelled");
                child.kill().await.ok();
                Err(MediaError::Cancelled)
            }
            _ = deadline => {
                let secs = self.timeout.map(|t| t.as_secs()).unwrap_or_default();
                warn!(timeout_secs = secs, "ffmpeg timed out");
                child.kill().await.ok();
                Err(MediaError::Timeout(secs))
            }
        }
    }
}

async fn collect_tail<R: AsyncRead + Unpin>(reader: R) -> String {
    let mut lines = BufReader::new(reader).lines();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    while let Ok(Some(line)) = lines.next_line().await {
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    Vec::from(tail).join("\n")
}

/// Locate the ffmpeg binary on `PATH`.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}
