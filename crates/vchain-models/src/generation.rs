//! Generation requests and results.

use serde::{Deserialize, Serialize};

use crate::model::ModelKind;

/// Maximum number of characters of the prompt or file name used in a task name.
pub const NAME_FRAGMENT_CHARS: usize = 20;

/// Input reference of a generation task.
///
/// A fresh generation takes an image (or nothing but text); a continuation
/// takes the previous output video. Never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum GenerationInput {
    /// Text-only prompting
    #[default]
    Text,
    /// Still image reference (fresh generation)
    Image(String),
    /// Previous output video (continuation)
    Video(String),
}

impl GenerationInput {
    pub fn image_url(&self) -> Option<&str> {
        match self {
            GenerationInput::Image(url) => Some(url),
            _ => None,
        }
    }

    pub fn video_url(&self) -> Option<&str> {
        match self {
            GenerationInput::Video(url) => Some(url),
            _ => None,
        }
    }

    pub fn is_continuation(&self) -> bool {
        matches!(self, GenerationInput::Video(_))
    }
}

/// Everything needed to submit one generation task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GenerateRequest {
    /// Model family and its options
    pub model: ModelKind,
    /// Input reference
    pub input: GenerationInput,
    /// Text prompt (empty for continuations)
    pub prompt: String,
    /// Original file name of the input, used for the task name
    pub asset_name: Option<String>,
    /// Explore mode
    pub explore_mode: bool,
    /// Asset group to store results in
    pub folder: Option<String>,
}

impl GenerateRequest {
    pub fn new(model: ModelKind, input: GenerationInput) -> Self {
        Self {
            model,
            input,
            ..Default::default()
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_asset_name(mut self, name: impl Into<String>) -> Self {
        self.asset_name = Some(name.into());
        self
    }

    pub fn with_explore_mode(mut self, explore: bool) -> Self {
        self.explore_mode = explore;
        self
    }

    pub fn with_folder(mut self, folder: Option<String>) -> Self {
        self.folder = folder.filter(|f| !f.trim().is_empty());
        self
    }

    /// Continuation of this request from a previous output: same model and
    /// options, video input, no prompt text.
    pub fn continuation(&self, video_url: impl Into<String>) -> Self {
        Self {
            model: self.model.clone(),
            input: GenerationInput::Video(video_url.into()),
            prompt: String::new(),
            asset_name: None,
            explore_mode: self.explore_mode,
            folder: self.folder.clone(),
        }
    }

    /// Asset group name: the requested folder or the model's display name.
    pub fn asset_group(&self) -> String {
        self.folder
            .clone()
            .unwrap_or_else(|| self.model.display_name().to_string())
    }

    /// Human-readable task name from the seed and truncated prompt/file name.
    pub fn task_name(&self, seed: u32) -> String {
        let mut name = format!("{} {}", self.model.display_name(), seed);
        for fragment in [Some(self.prompt.as_str()), self.asset_name.as_deref()]
            .into_iter()
            .flatten()
        {
            let fragment = truncate_chars(fragment.trim(), NAME_FRAGMENT_CHARS);
            if !fragment.is_empty() {
                name.push_str(", ");
                name.push_str(&fragment);
            }
        }
        name
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// A completed generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    /// Remote task identifier
    pub task_id: String,
    /// Artifact URL as returned by the service
    pub url: String,
    /// Content-addressed URL derived from the artifact URL, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_url: Option<String>,
    /// Preview image URLs
    #[serde(default)]
    pub preview_urls: Vec<String>,
}

impl Generation {
    /// URL to feed into the next step: the normalized URL when known.
    pub fn continuation_url(&self) -> &str {
        self.normalized_url.as_deref().unwrap_or(&self.url)
    }
}
