//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Chain workflow configuration.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Directory for working files (segments, frames, manifests)
    pub work_dir: PathBuf,
    /// Deadline for each best-effort remote asset deletion
    pub asset_delete_timeout: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir(),
            asset_delete_timeout: Duration::from_secs(15),
        }
    }
}

impl ChainConfig {
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_asset_delete_timeout(mut self, timeout: Duration) -> Self {
        self.asset_delete_timeout = timeout;
        self
    }
}
