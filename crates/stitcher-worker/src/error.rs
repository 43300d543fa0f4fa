//! Worker error types.

use stitcher_generation::GenerationError;
use stitcher_media::MediaError;
use stitcher_models::ValidationError;
use stitcher_storage::StorageError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Everything that can end a job. The `Display` form is the `error` field
/// of a failed result.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("ffmpeg error: {}", media_detail(.0))]
    Media(#[source] MediaError),

    /// Inputs were rejected before any tool ran.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Generation error: {0}")]
    Remote(#[from] GenerationError),

    #[error("Transfer error: {0}")]
    Transfer(#[source] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Tool stderr when there is any, otherwise the error itself.
fn media_detail(err: &MediaError) -> String {
    match err.stderr() {
        Some(stderr) => stderr.trim().to_string(),
        None => err.to_string(),
    }
}

impl From<MediaError> for WorkerError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::IncompatibleInputs(reason) => Self::Precondition(reason),
            other => Self::Media(other),
        }
    }
}

impl From<ValidationError> for WorkerError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StorageError> for WorkerError {
    fn from(err: StorageError) -> Self {
        if err.is_configuration() {
            Self::Validation(err.to_string())
        } else {
            Self::Transfer(err)
        }
    }
}

impl WorkerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::Validation(_) => "validation",
            WorkerError::Media(_) => "media",
            WorkerError::Precondition(_) => "precondition",
            WorkerError::Remote(_) => "remote",
            WorkerError::Transfer(_) => "transfer",
            WorkerError::ConfigError(_) => "config",
            WorkerError::Io(_) => "io",
        }
    }

    /// Failed before any collaborator was touched.
    pub fn is_validation(&self) -> bool {
        matches!(self, WorkerError::Validation(_))
    }
}
