//! Local chain segments.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One media file produced at one step of a chain.
///
/// Segment 0 is the copy of the original input; later segments are
/// downloaded generations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSegment {
    /// Position in the chain
    pub index: usize,
    /// Local file path
    pub path: PathBuf,
    /// Remote URL the file was downloaded from
    pub source_url: Option<String>,
}

impl ChainSegment {
    pub fn original(path: impl Into<PathBuf>) -> Self {
        Self {
            index: 0,
            path: path.into(),
            source_url: None,
        }
    }

    pub fn generated(index: usize, path: impl Into<PathBuf>, source_url: impl Into<String>) -> Self {
        Self {
            index,
            path: path.into(),
            source_url: Some(source_url.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_original(&self) -> bool {
        self.source_url.is_none()
    }
}
