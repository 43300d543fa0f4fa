//! Job orchestration.
//!
//! [`Pipeline::handle_event`] is the single entry point for every process
//! adapter. A job is validated before any collaborator is built, runs
//! sequentially inside its own working directory, and always ends as one
//! [`PipelineResult`].

mod generate;
mod generate_batch;
pub mod plan;
mod split_audio;
mod stitch;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::Instrument;

use stitcher_media::MediaToolkit;
use stitcher_models::{
    ArtifactRole, JobId, JobOutput, JobRequest, JobTask, MediaArtifact, PipelineResult,
};
use stitcher_storage::{BlobStore, UrlFetcher};

use crate::backends::Backends;
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::workdir::WorkDir;

/// Runs jobs against a set of collaborators.
pub struct Pipeline {
    config: WorkerConfig,
    backends: Arc<dyn Backends>,
}

impl Pipeline {
    pub fn new(config: WorkerConfig, backends: Arc<dyn Backends>) -> Self {
        Self { config, backends }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Parse, validate and run a raw `{ "input": {...} }` event.
    ///
    /// Never fails: errors and panics become a `FAILED` result.
    pub async fn handle_event(&self, event: serde_json::Value) -> PipelineResult {
        let job_id = JobId::new();
        let run = AssertUnwindSafe(self.parse_and_run(job_id.clone(), event));

        match run.catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                JobLogger::unparsed(&job_id).log_error(&format!("panicked: {}", message));
                PipelineResult::failed(format!("Internal error: {}", message))
            }
        }
    }

    /// Run an already validated request.
    pub async fn run(&self, request: JobRequest) -> PipelineResult {
        self.run_with_id(JobId::new(), request).await
    }

    async fn parse_and_run(&self, job_id: JobId, event: serde_json::Value) -> PipelineResult {
        match JobRequest::from_event(event) {
            Ok(request) => self.run_with_id(job_id, request).await,
            Err(e) => {
                let err = WorkerError::from(e);
                JobLogger::unparsed(&job_id).log_error(&err.to_string());
                metrics::record_job_failed("unknown", err.kind(), 0.0);
                PipelineResult::failed(err.to_string())
            }
        }
    }

    async fn run_with_id(&self, job_id: JobId, request: JobRequest) -> PipelineResult {
        let logger = JobLogger::new(&job_id, request.mode());
        let span = logger.create_span();
        let started = Instant::now();

        logger.log_start(&format!("bucket={}", request.credentials.bucket_name));

        let outcome = self
            .execute(&job_id, &request, &logger)
            .instrument(span)
            .await;
        let elapsed = started.elapsed().as_secs_f64();

        match outcome {
            Ok(output) => {
                logger.log_completion(&format!("finished in {:.1}s", elapsed));
                metrics::record_job_completed(logger.mode(), elapsed);
                PipelineResult::completed(output)
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                metrics::record_job_failed(logger.mode(), e.kind(), elapsed);
                PipelineResult::failed(e.to_string())
            }
        }
    }

    async fn execute(
        &self,
        job_id: &JobId,
        request: &JobRequest,
        logger: &JobLogger,
    ) -> WorkerResult<JobOutput> {
        let store = self.backends.blob_store(&request.credentials)?;
        let generation = match &request.task {
            JobTask::GenerateAndStitch(task) | JobTask::GenerateAndStitchBatch(task) => {
                Some(self.backends.generation(&task.generation_api_token)?)
            }
            _ => None,
        };

        let ctx = JobContext {
            store,
            fetcher: self.backends.fetcher(),
            media: self.backends.media(),
            workdir: WorkDir::create(&self.config.work_dir, job_id)?,
            logger,
            config: &self.config,
        };

        match (&request.task, generation) {
            (JobTask::Stitch(task), _) => stitch::run(&ctx, task).await,
            (JobTask::SplitAudio(task), _) => split_audio::run(&ctx, task).await,
            (JobTask::GenerateAndStitch(task), Some(api)) => {
                generate::run(&ctx, api.as_ref(), task).await
            }
            (JobTask::GenerateAndStitchBatch(task), Some(api)) => {
                generate_batch::run(&ctx, api.as_ref(), task).await
            }
            (task, None) => Err(WorkerError::config_error(format!(
                "no generation client for mode {}",
                task.mode()
            ))),
        }
    }
}

/// Everything a mode needs while it runs.
pub(crate) struct JobContext<'a> {
    pub store: Arc<dyn BlobStore>,
    pub fetcher: Arc<dyn UrlFetcher>,
    pub media: Arc<dyn MediaToolkit>,
    pub workdir: WorkDir,
    pub logger: &'a JobLogger,
    pub config: &'a WorkerConfig,
}

impl JobContext<'_> {
    /// Download a bucket object into the working directory.
    pub async fn download_key(
        &self,
        key: &str,
        file_name: &str,
        role: ArtifactRole,
    ) -> WorkerResult<MediaArtifact> {
        let path = self.workdir.file(file_name);
        self.store.download_file(key, &path).await?;
        Ok(MediaArtifact::new(path, role))
    }

    /// Download an external URL into the working directory.
    pub async fn fetch_url(
        &self,
        url: &str,
        file_name: &str,
        role: ArtifactRole,
    ) -> WorkerResult<MediaArtifact> {
        let path = self.workdir.file(file_name);
        self.fetcher.download(url, &path).await?;
        Ok(MediaArtifact::new(path, role))
    }

    /// Upload an artifact and return its public URL.
    pub async fn upload(
        &self,
        artifact: &MediaArtifact,
        key: &str,
        content_type: &str,
    ) -> WorkerResult<String> {
        self.store
            .upload_file(artifact.path(), key, content_type)
            .await?;
        metrics::record_upload(self.logger.mode());
        Ok(self.store.public_url(key))
    }

    /// Log, but do not fail on, a public URL that does not answer HEAD.
    pub async fn check_reachable(&self, url: &str) {
        if !self.fetcher.is_reachable(url).await {
            self.logger
                .log_warning(&format!("{} is not reachable yet; continuing", url));
        }
    }

    pub fn new_artifact(&self, file_name: impl AsRef<Path>, role: ArtifactRole) -> MediaArtifact {
        MediaArtifact::new(self.workdir.file(file_name), role)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
