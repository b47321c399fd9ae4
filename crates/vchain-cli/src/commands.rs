//! Command handlers.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;
use vchain_client::RemoteClient;
use vchain_media::{check_ffmpeg, FfmpegSplicer};
use vchain_pipeline::{
    extend_video, generate_and_extend, loop_video, ChainContext, ExtendJob, GenerateJob, LoopJob,
};

use crate::cli::Command;
use crate::settings::{required_path, Settings};

/// Version line: version, commit and build date.
pub fn version_line() -> String {
    [
        env!("CARGO_PKG_VERSION"),
        option_env!("VCHAIN_COMMIT").unwrap_or("dev"),
        option_env!("VCHAIN_DATE").unwrap_or("dev"),
    ]
    .join(" ")
}

/// Run `command` with resolved `settings`, writing results to `out`.
pub async fn run(
    command: &Command,
    settings: &Settings,
    cancel: CancellationToken,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::Generate(_) => generate(settings, cancel, out).await,
        Command::Extend(_) => extend(settings, cancel, out).await,
        Command::Loop(_) => run_loop(settings, cancel).await,
        Command::Version => {
            writeln!(out, "{}", version_line())?;
            Ok(())
        }
    }
}

fn context(settings: &Settings, cancel: CancellationToken) -> Result<ChainContext> {
    let client = RemoteClient::new(settings.require_token()?, settings.client_config()?)
        .context("failed to create client")?;
    Ok(ChainContext::new(
        settings.chain_config(),
        Arc::new(client),
        Arc::new(FfmpegSplicer::new().with_cancel(cancel)),
    ))
}

async fn generate(settings: &Settings, cancel: CancellationToken, out: &mut dyn Write) -> Result<()> {
    let job = GenerateJob {
        settings: settings.generation_settings()?,
        image: settings.image.clone().filter(|p| !p.as_os_str().is_empty()),
        prompt: settings.text.clone(),
        extend: settings.extend,
        output: settings.output.clone(),
    };
    job.validate()?;

    let ctx = context(settings, cancel.clone())?;
    let outcome = generate_and_extend(&ctx, &job, &cancel).await?;
    if let Some(path) = &outcome.video_path {
        info!("Video saved to {}", path.display());
    }
    print_json(out, &outcome.generation)
}

async fn extend(settings: &Settings, cancel: CancellationToken, out: &mut dyn Write) -> Result<()> {
    let job = ExtendJob {
        settings: settings.generation_settings()?,
        input: required_path(&settings.input, "input")?.to_path_buf(),
        steps: settings.n,
        output: settings.output.clone(),
    };
    job.validate()?;
    check_ffmpeg()?;

    let ctx = context(settings, cancel.clone())?;
    let outcome = extend_video(&ctx, &job, &cancel).await?;
    for (i, url) in outcome.urls.iter().enumerate() {
        writeln!(out, "Video URL {}: {}", i + 1, url)?;
    }
    if let Some(path) = &outcome.output {
        info!("Video saved to {}", path.display());
    }
    Ok(())
}

async fn run_loop(settings: &Settings, cancel: CancellationToken) -> Result<()> {
    let job = LoopJob {
        input: required_path(&settings.input, "input")?.to_path_buf(),
        output: required_path(&settings.output, "output")?.to_path_buf(),
    };
    check_ffmpeg()?;
    let splicer = FfmpegSplicer::new().with_cancel(cancel);
    loop_video(&splicer, &settings.chain_config(), &job).await?;
    info!("Video saved to {}", job.output.display());
    Ok(())
}

fn print_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    writeln!(out, "{}", json)?;
    Ok(())
}
