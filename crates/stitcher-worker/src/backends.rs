//! Construction of the collaborators a job talks to.
//!
//! Storage and generation clients are bound to credentials carried by the
//! job itself, so they are built per job. The fetcher and the media toolkit
//! carry no per-job state and are shared.

use std::sync::Arc;

use stitcher_generation::{GenerationApi, ReplicateClient};
use stitcher_media::{FfmpegToolkit, MediaToolkit};
use stitcher_models::StoreCredentials;
use stitcher_storage::{BlobStore, HttpFetcher, R2Client, UrlFetcher};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;

/// Factory for job collaborators.
pub trait Backends: Send + Sync {
    /// Blob store for the bucket named in `credentials`.
    fn blob_store(&self, credentials: &StoreCredentials) -> WorkerResult<Arc<dyn BlobStore>>;

    /// Generation API client authenticated with `token`.
    fn generation(&self, token: &str) -> WorkerResult<Arc<dyn GenerationApi>>;

    fn fetcher(&self) -> Arc<dyn UrlFetcher>;

    fn media(&self) -> Arc<dyn MediaToolkit>;
}

/// Production collaborators: R2, Replicate, reqwest and ffmpeg.
pub struct LiveBackends {
    config: WorkerConfig,
    fetcher: Arc<HttpFetcher>,
    media: Arc<FfmpegToolkit>,
}

impl LiveBackends {
    pub fn new(config: &WorkerConfig) -> WorkerResult<Self> {
        Ok(Self {
            config: config.clone(),
            fetcher: Arc::new(HttpFetcher::new(config.fetch_config())?),
            media: Arc::new(FfmpegToolkit::with_timeout(config.ffmpeg_timeout_secs)),
        })
    }
}

impl Backends for LiveBackends {
    fn blob_store(&self, credentials: &StoreCredentials) -> WorkerResult<Arc<dyn BlobStore>> {
        Ok(Arc::new(R2Client::from_credentials(
            credentials,
            self.config.download_timeout,
        )?))
    }

    fn generation(&self, token: &str) -> WorkerResult<Arc<dyn GenerationApi>> {
        Ok(Arc::new(ReplicateClient::new(
            self.config.replicate_config(),
            token,
        )?))
    }

    fn fetcher(&self) -> Arc<dyn UrlFetcher> {
        self.fetcher.clone()
    }

    fn media(&self) -> Arc<dyn MediaToolkit> {
        self.media.clone()
    }
}
