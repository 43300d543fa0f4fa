//! Blob store abstraction used by the pipeline.

use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Object storage operations a job needs.
///
/// Keys are bucket-relative. Implementations must be usable from a single
/// job task; no cross-job sharing is assumed.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch `key` and write it to `path`, creating parent directories.
    async fn download_file(&self, key: &str, path: &Path) -> StorageResult<()>;

    /// Store the file at `path` under `key`.
    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()>;

    /// Public URL an external service can fetch `key` from.
    fn public_url(&self, key: &str) -> String;
}
