//! Chain workflows.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use vchain_media::fs_utils::copy_file;
use vchain_media::{ConcatManifest, Splicer};
use vchain_models::{ChainSegment, GenerationInput};

use crate::cleanup::{AssetCleanup, TempFiles};
use crate::config::ChainConfig;
use crate::error::PipelineResult;
use crate::job::{file_name, ExtendJob, ExtendOutcome, GenerateJob, GenerateOutcome, LoopJob};
use crate::logging::ChainLogger;
use crate::service::GenerationService;

/// Collaborators shared by the workflows.
pub struct ChainContext {
    pub config: ChainConfig,
    pub service: Arc<dyn GenerationService>,
    pub splicer: Arc<dyn Splicer>,
}

impl ChainContext {
    pub fn new(
        config: ChainConfig,
        service: Arc<dyn GenerationService>,
        splicer: Arc<dyn Splicer>,
    ) -> Self {
        Self {
            config,
            service,
            splicer,
        }
    }

    fn asset_cleanup(&self) -> AssetCleanup<'_> {
        AssetCleanup::new(self.service.as_ref(), self.config.asset_delete_timeout)
    }
}

/// Generate one clip, extend it `job.extend` times by continuation and
/// download the last result.
///
/// The download goes to `job.output`, or to `<work_dir>/<stem>.mp4` when the
/// chain was extended without an explicit output. The uploaded image is
/// deleted on every exit path.
pub async fn generate_and_extend(
    ctx: &ChainContext,
    job: &GenerateJob,
    cancel: &CancellationToken,
) -> PipelineResult<GenerateOutcome> {
    job.validate()?;
    let logger = ChainLogger::new("generate", job.stem());
    let span = logger.create_span();

    let mut assets = ctx.asset_cleanup();
    let result = run_generate(ctx, job, &logger, &mut assets, cancel)
        .instrument(span.clone())
        .await;
    assets.run().instrument(span).await;
    result
}

async fn run_generate(
    ctx: &ChainContext,
    job: &GenerateJob,
    logger: &ChainLogger,
    assets: &mut AssetCleanup<'_>,
    cancel: &CancellationToken,
) -> PipelineResult<GenerateOutcome> {
    let mut request = job.settings.request(GenerationInput::Text);
    if let Some(image) = &job.image {
        let name = file_name(image)?;
        let bytes = tokio::fs::read(image).await?;
        logger.log_start(&format!("uploading {}", name));
        let asset = ctx.service.upload(&name, &bytes, cancel).await?;
        assets.register(asset.id);
        request = job
            .settings
            .request(GenerationInput::Image(asset.url))
            .with_asset_name(name);
    } else {
        logger.log_start("text prompt only");
    }
    let request = request.with_prompt(job.prompt.clone());

    let total = job.extend + 1;
    logger.log_step(1, total, "generating");
    let mut generation = ctx.service.generate(&request, cancel).await?;

    for i in 0..job.extend {
        logger.log_step(i + 2, total, "extending");
        let next = request.continuation(generation.continuation_url());
        generation = ctx.service.generate(&next, cancel).await?;
    }

    let video_path = job.output.clone().or_else(|| {
        (job.extend > 0).then(|| ctx.config.work_dir.join(format!("{}.mp4", job.stem())))
    });
    if let Some(path) = &video_path {
        ctx.service.download(&generation.url, path, cancel).await?;
        logger.log_completion(&format!("saved {}", path.display()));
    } else {
        logger.log_warning("no output path, the video was not downloaded");
        logger.log_completion(&generation.url);
    }

    Ok(GenerateOutcome {
        generation,
        video_path,
    })
}

/// Extend an existing video `job.steps` times.
///
/// Each step extracts the last frame of the current segment, uploads it,
/// generates a fresh clip from it and downloads that clip as the next
/// segment. With `job.output`, all segments are concatenated in order
/// without re-encoding. Segments, frames and the manifest are removed and
/// uploaded frames deleted on every exit path.
pub async fn extend_video(
    ctx: &ChainContext,
    job: &ExtendJob,
    cancel: &CancellationToken,
) -> PipelineResult<ExtendOutcome> {
    job.validate()?;
    let logger = ChainLogger::new("extend", file_name(&job.input)?);
    let span = logger.create_span();

    let mut files = TempFiles::new();
    let mut assets = ctx.asset_cleanup();
    let result = run_extend(ctx, job, &logger, &mut files, &mut assets, cancel)
        .instrument(span.clone())
        .await;
    files.remove_all().await;
    assets.run().instrument(span).await;
    result
}

async fn run_extend(
    ctx: &ChainContext,
    job: &ExtendJob,
    logger: &ChainLogger,
    files: &mut TempFiles,
    assets: &mut AssetCleanup<'_>,
    cancel: &CancellationToken,
) -> PipelineResult<ExtendOutcome> {
    let stem = job.stem()?;
    let work_dir = &ctx.config.work_dir;
    tokio::fs::create_dir_all(work_dir).await?;

    logger.log_start(&format!("{} steps", job.steps));
    let original = files.track(work_dir.join(format!("{}-0.mp4", stem)));
    copy_file(&job.input, &original).await?;

    let mut current = original.clone();
    let mut segments = vec![ChainSegment::original(original)];
    let mut urls = Vec::with_capacity(job.steps);

    for i in 0..job.steps {
        let step = i + 1;

        logger.log_step(step, job.steps, "extracting last frame");
        let frame = files.track(work_dir.join(format!("{}-{}.jpg", stem, i)));
        ctx.splicer.extract_last_frame(&current, &frame).await?;
        let bytes = tokio::fs::read(&frame).await?;
        let frame_name = file_name(&frame)?;

        let asset = ctx.service.upload(&frame_name, &bytes, cancel).await?;
        assets.register(asset.id);

        logger.log_step(step, job.steps, "generating");
        let request = job
            .settings
            .request(GenerationInput::Image(asset.url))
            .with_asset_name(frame_name);
        let generation = ctx.service.generate(&request, cancel).await?;
        files.remove(&frame).await;

        let segment = files.track(work_dir.join(format!("{}-{}.mp4", stem, step)));
        ctx.service.download(&generation.url, &segment, cancel).await?;
        logger.log_step(step, job.steps, &generation.url);

        urls.push(generation.url.clone());
        current = segment.clone();
        segments.push(ChainSegment::generated(step, segment, generation.url));
    }

    if let Some(output) = &job.output {
        let manifest = files.track(work_dir.join(format!("{}-list.txt", stem)));
        ConcatManifest::from_paths(segments.iter().map(ChainSegment::path))
            .write(&manifest)
            .await?;
        ctx.splicer.concat_manifest(&manifest, output).await?;
        logger.log_completion(&format!("{} segments joined into {}", segments.len(), output.display()));
    } else {
        logger.log_completion(&format!("{} segments generated", urls.len()));
    }

    Ok(ExtendOutcome {
        urls,
        output: job.output.clone(),
    })
}

/// Write `job.input` followed by its reverse to `job.output`.
pub async fn loop_video(
    splicer: &dyn Splicer,
    config: &ChainConfig,
    job: &LoopJob,
) -> PipelineResult<()> {
    let name = file_name(&job.input)?;
    let logger = ChainLogger::new("loop", name.clone());

    let mut files = TempFiles::new();
    let result = run_loop(splicer, config, job, &name, &mut files)
        .instrument(logger.create_span())
        .await;
    files.remove_all().await;
    if result.is_ok() {
        logger.log_completion(&job.output.display().to_string());
    }
    result
}

async fn run_loop(
    splicer: &dyn Splicer,
    config: &ChainConfig,
    job: &LoopJob,
    name: &str,
    files: &mut TempFiles,
) -> PipelineResult<()> {
    tokio::fs::create_dir_all(&config.work_dir).await?;

    let reversed = files.track(config.work_dir.join(format!("{}-reversed.mp4", name)));
    splicer.reverse(&job.input, &reversed).await?;

    let manifest = files.track(config.work_dir.join(format!("{}-list.txt", name)));
    ConcatManifest::from_paths([job.input.as_path(), reversed.as_path()])
        .write(&manifest)
        .await?;
    splicer.concat_manifest(&manifest, &job.output).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_segment_names_follow_input_stem() {
        let job = ExtendJob {
            settings: Default::default(),
            input: PathBuf::from("/videos/car.mp4"),
            steps: 2,
            output: None,
        };
        assert_eq!(job.stem().unwrap(), "car");
    }
}
