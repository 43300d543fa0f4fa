//! Shared data models for the stitcher worker.
//!
//! This crate provides Serde-serializable types for:
//! - Job events and validated per-mode job requests
//! - Object store credentials
//! - Media artifacts produced during a pipeline run
//! - Terminal pipeline results

pub mod artifact;
pub mod credentials;
pub mod error;
pub mod job;
pub mod result;

// Re-export common types
pub use artifact::{ArtifactRole, MediaArtifact};
pub use credentials::StoreCredentials;
pub use error::{ValidationError, ValidationResult};
pub use job::{
    GenerateTask, JobEvent, JobId, JobInput, JobMode, JobRequest, JobTask, SplitAudioTask,
    StitchTask, DEFAULT_CHUNK_DURATION,
};
pub use result::{ChunksOutput, JobOutput, PipelineResult, ResultStatus, VideoOutput};
