//! Workflow inputs and outcomes.

use std::path::{Path, PathBuf};

use vchain_models::{GenerateRequest, Generation, GenerationInput, ModelKind};

use crate::error::{PipelineError, PipelineResult};

/// Options shared by every generation a workflow submits.
#[derive(Debug, Clone, Default)]
pub struct GenerationSettings {
    pub model: ModelKind,
    pub explore_mode: bool,
    pub folder: Option<String>,
}

impl GenerationSettings {
    pub fn new(model: ModelKind) -> Self {
        Self {
            model,
            ..Default::default()
        }
    }

    pub fn with_explore_mode(mut self, explore: bool) -> Self {
        self.explore_mode = explore;
        self
    }

    pub fn with_folder(mut self, folder: Option<String>) -> Self {
        self.folder = folder;
        self
    }

    /// A fresh request for `input` with these settings.
    pub fn request(&self, input: GenerationInput) -> GenerateRequest {
        GenerateRequest::new(self.model.clone(), input)
            .with_explore_mode(self.explore_mode)
            .with_folder(self.folder.clone())
    }
}

/// Generate from an image and/or prompt, then extend by continuation.
#[derive(Debug, Clone, Default)]
pub struct GenerateJob {
    pub settings: GenerationSettings,
    pub image: Option<PathBuf>,
    pub prompt: String,
    /// Number of continuation generations after the first one
    pub extend: usize,
    pub output: Option<PathBuf>,
}

impl GenerateJob {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.image.is_none() && self.prompt.trim().is_empty() {
            return Err(PipelineError::invalid_input("image or text is required"));
        }
        Ok(())
    }

    /// Base name for the generated download path.
    pub fn stem(&self) -> String {
        self.image
            .as_deref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "generation".to_string())
    }
}

/// Extend an existing video by chaining last-frame generations.
#[derive(Debug, Clone)]
pub struct ExtendJob {
    pub settings: GenerationSettings,
    pub input: PathBuf,
    /// Number of generated segments to append
    pub steps: usize,
    /// Where to write the concatenated result; nothing is spliced without it
    pub output: Option<PathBuf>,
}

impl ExtendJob {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.steps < 1 {
            return Err(PipelineError::invalid_input("n must be greater than 0"));
        }
        file_name(&self.input).map(|_| ())
    }

    pub fn stem(&self) -> PipelineResult<String> {
        self.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| {
                PipelineError::invalid_input(format!("{} has no file name", self.input.display()))
            })
    }
}

/// Append a reversed copy of a clip to itself.
#[derive(Debug, Clone)]
pub struct LoopJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Result of [`generate_and_extend`](crate::generate_and_extend).
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    /// The last generation of the chain
    pub generation: Generation,
    /// Local copy of the last generation, when one was downloaded
    pub video_path: Option<PathBuf>,
}

/// Result of [`extend_video`](crate::extend_video).
#[derive(Debug, Clone)]
pub struct ExtendOutcome {
    /// Artifact URL of every generated step, in order
    pub urls: Vec<String>,
    /// Concatenated output, when requested
    pub output: Option<PathBuf>,
}

pub(crate) fn file_name(path: &Path) -> PipelineResult<String> {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| PipelineError::invalid_input(format!("{} has no file name", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vchain_models::Gen2Options;

    #[test]
    fn test_generate_requires_image_or_text() {
        let job = GenerateJob::default();
        assert!(matches!(job.validate(), Err(PipelineError::InvalidInput(_))));

        let job = GenerateJob {
            prompt: "a red car".into(),
            ..Default::default()
        };
        assert!(job.validate().is_ok());
        assert_eq!(job.stem(), "generation");

        let job = GenerateJob {
            image: Some(PathBuf::from("/photos/car.jpg")),
            ..Default::default()
        };
        assert!(job.validate().is_ok());
        assert_eq!(job.stem(), "car");
    }

    #[test]
    fn test_extend_requires_steps() {
        let job = ExtendJob {
            settings: GenerationSettings::default(),
            input: PathBuf::from("car.mp4"),
            steps: 0,
            output: None,
        };
        assert!(job.validate().is_err());
        assert!(ExtendJob { steps: 1, ..job }.validate().is_ok());
    }

    #[test]
    fn test_settings_flow_into_request() {
        let settings = GenerationSettings::new(ModelKind::gen2(Gen2Options::default()))
            .with_explore_mode(true)
            .with_folder(Some("chains".into()));
        let request = settings.request(GenerationInput::Image("https://u.test/a.jpg".into()));
        assert!(request.explore_mode);
        assert_eq!(request.asset_group(), "chains");
        assert!(request.prompt.is_empty());
    }
}
