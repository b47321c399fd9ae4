//! Concat demuxer manifests.
//!
//! The concat demuxer reads one `file '<path>'` line per clip, in order.
//! Paths are written absolute so the manifest can live anywhere.

use std::path::{Path, PathBuf};

use crate::error::{MediaError, MediaResult};

/// Ordered list of clips to concatenate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcatManifest {
    entries: Vec<PathBuf>,
}

impl ConcatManifest {
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            entries: paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the manifest text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let path = std::path::absolute(entry).unwrap_or_else(|_| entry.clone());
            out.push_str("file '");
            out.push_str(&escape(&path.to_string_lossy()));
            out.push_str("'\n");
        }
        out
    }

    /// Write the manifest to `path`.
    pub async fn write(&self, path: impl AsRef<Path>) -> MediaResult<()> {
        if self.is_empty() {
            return Err(MediaError::EmptyConcat);
        }
        tokio::fs::write(path.as_ref(), self.render()).await?;
        Ok(())
    }
}

// Single quotes can't be escaped inside a quoted string, so close, escape, reopen.
fn escape(path: &str) -> String {
    path.replace('\'', r"'\''")
}
