//! Per-job scratch directory.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use stitcher_models::JobId;

use crate::error::WorkerResult;

/// Directory owned by one job. Removed with everything in it when dropped,
/// whichever way the job ends.
#[derive(Debug)]
pub struct WorkDir {
    dir: TempDir,
}

impl WorkDir {
    /// Create a fresh directory under `root`, creating `root` if needed.
    pub fn create(root: &Path, job_id: &JobId) -> WorkerResult<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("job-{}-", job_id))
            .tempdir_in(root)?;
        debug!(path = %dir.path().display(), "Created work directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of `name` inside the directory.
    pub fn file(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Create and return a subdirectory.
    pub async fn subdir(&self, name: &str) -> WorkerResult<PathBuf> {
        let path = self.dir.path().join(name);
        tokio::fs::create_dir_all(&path).await?;
        Ok(path)
    }
}
