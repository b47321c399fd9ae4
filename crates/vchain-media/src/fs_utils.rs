//! Filesystem helpers for working files.

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Copy `src` to `dst`, creating the destination directory if needed.
///
/// Returns the number of bytes copied.
pub async fn copy_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<u64> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if !fs::try_exists(src).await.unwrap_or(false) {
        return Err(MediaError::FileNotFound(src.to_path_buf()));
    }

    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let bytes = fs::copy(src, dst).await?;
    tracing::debug!("Copied {} -> {} ({} bytes)", src.display(), dst.display(), bytes);
    Ok(bytes)
}

/// Remove a file, logging instead of failing.
///
/// A file that is already gone counts as removed.
pub async fn remove_best_effort(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
            false
        }
    }
}

/// Synchronous variant of [`remove_best_effort`] for use in `Drop`.
pub fn remove_best_effort_sync(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
            false
        }
    }
}
