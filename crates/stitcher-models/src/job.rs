//! Job definitions: the wire envelope and the validated per-mode request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::credentials::{non_empty, required, StoreCredentials};
use crate::error::{ValidationError, ValidationResult};

/// Default segment / leading clip length in seconds.
pub const DEFAULT_CHUNK_DURATION: u32 = 25;

/// Unique identifier for a pipeline run (used for logging only).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Processing mode selected by the `mode` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobMode {
    /// Concatenate video chunks and mux them with one audio track
    #[default]
    StitchVideo,
    /// Segment one audio object into fixed-length chunks
    SplitAudio,
    /// Lip-sync a leading audio clip, pad with looped fallback video
    GenerateAndStitch,
    /// Lip-sync every audio chunk separately and concatenate the results
    GenerateAndStitchBatch,
}

impl JobMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobMode::StitchVideo => "stitch_video",
            JobMode::SplitAudio => "split_audio",
            JobMode::GenerateAndStitch => "generate_and_stitch",
            JobMode::GenerateAndStitchBatch => "generate_and_stitch_batch",
        }
    }
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "stitch" | "stitch_video" => Ok(JobMode::StitchVideo),
            "split_audio" => Ok(JobMode::SplitAudio),
            "generate_and_stitch" => Ok(JobMode::GenerateAndStitch),
            "generate_and_stitch_batch" => Ok(JobMode::GenerateAndStitchBatch),
            other => Err(ValidationError::UnknownMode(other.to_string())),
        }
    }
}

/// Process-boundary envelope: `{ "input": { ... } }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobEvent {
    #[serde(default)]
    pub input: serde_json::Value,
}

/// Flat wire shape of a job. Every field is optional here; `JobRequest`
/// decides what each mode requires.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobInput {
    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default)]
    pub r2_account_id: Option<String>,
    #[serde(default)]
    pub r2_access_key_id: Option<String>,
    #[serde(default)]
    pub r2_secret_access_key: Option<String>,
    #[serde(default)]
    pub r2_bucket_name: Option<String>,
    #[serde(default)]
    pub r2_public_url: Option<String>,
    #[serde(default)]
    pub r2_endpoint: Option<String>,

    /// Ordered R2 keys of the video chunks (stitch mode)
    #[serde(default)]
    pub video_chunks: Option<Vec<String>>,
    #[serde(default)]
    pub audio_key: Option<String>,
    #[serde(default)]
    pub output_key: Option<String>,
    /// Seconds per chunk / leading clip; integral floats such as `25.0` are accepted
    #[serde(default)]
    pub chunk_duration: Option<serde_json::Number>,
    /// Fallback (hero) video URL for generation modes
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default, alias = "replicate_api_token")]
    pub generation_api_token: Option<String>,
}

/// Concatenate chunks, mux with audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchTask {
    pub video_chunks: Vec<String>,
    pub audio_key: String,
    pub output_key: String,
}

/// Segment audio into fixed-duration chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAudioTask {
    pub audio_key: String,
    pub chunk_duration: u32,
}

/// Shared fields of both generation strategies.
#[derive(Clone, PartialEq, Eq)]
pub struct GenerateTask {
    pub audio_key: String,
    pub output_key: String,
    pub generation_api_token: String,
    /// Fallback video override; the worker's configured default applies when absent
    pub video_url: Option<String>,
    pub chunk_duration: u32,
}

impl fmt::Debug for GenerateTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateTask")
            .field("audio_key", &self.audio_key)
            .field("output_key", &self.output_key)
            .field("generation_api_token", &"<redacted>")
            .field("video_url", &self.video_url)
            .field("chunk_duration", &self.chunk_duration)
            .finish()
    }
}

/// Mode-specific work, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobTask {
    Stitch(StitchTask),
    SplitAudio(SplitAudioTask),
    GenerateAndStitch(GenerateTask),
    GenerateAndStitchBatch(GenerateTask),
}

impl JobTask {
    pub fn mode(&self) -> JobMode {
        match self {
            JobTask::Stitch(_) => JobMode::StitchVideo,
            JobTask::SplitAudio(_) => JobMode::SplitAudio,
            JobTask::GenerateAndStitch(_) => JobMode::GenerateAndStitch,
            JobTask::GenerateAndStitchBatch(_) => JobMode::GenerateAndStitchBatch,
        }
    }
}

/// A validated, immutable job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub credentials: StoreCredentials,
    pub task: JobTask,
}

impl JobRequest {
    /// Parse and validate a raw event (`{ "input": {...} }`).
    pub fn from_event(event: serde_json::Value) -> ValidationResult<Self> {
        let event: JobEvent = serde_json::from_value(event)
            .map_err(|e| ValidationError::malformed(e.to_string()))?;

        let input = if event.input.is_null() {
            JobInput::default()
        } else {
            serde_json::from_value(event.input)
                .map_err(|e| ValidationError::malformed(e.to_string()))?
        };

        Self::from_input(input)
    }

    /// Validate a parsed input. Credentials are checked first.
    pub fn from_input(input: JobInput) -> ValidationResult<Self> {
        let credentials = StoreCredentials::from_parts(
            input.r2_account_id,
            input.r2_access_key_id,
            input.r2_secret_access_key,
            input.r2_bucket_name,
            input.r2_public_url,
            input.r2_endpoint,
        )?;

        let mode: JobMode = input.mode.as_deref().unwrap_or_default().parse()?;

        let task = match mode {
            JobMode::StitchVideo => {
                let video_chunks = input
                    .video_chunks
                    .ok_or(ValidationError::MissingField("video_chunks"))?;
                if video_chunks.is_empty() {
                    return Err(ValidationError::invalid(
                        "video_chunks",
                        "at least one chunk key is required",
                    ));
                }
                if video_chunks.iter().any(|k| k.trim().is_empty()) {
                    return Err(ValidationError::invalid(
                        "video_chunks",
                        "chunk keys must not be empty",
                    ));
                }
                JobTask::Stitch(StitchTask {
                    video_chunks,
                    audio_key: required("audio_key", input.audio_key)?,
                    output_key: required("output_key", input.output_key)?,
                })
            }
            JobMode::SplitAudio => JobTask::SplitAudio(SplitAudioTask {
                audio_key: required("audio_key", input.audio_key)?,
                chunk_duration: parse_chunk_duration(input.chunk_duration.as_ref())?,
            }),
            JobMode::GenerateAndStitch | JobMode::GenerateAndStitchBatch => {
                let task = GenerateTask {
                    audio_key: required("audio_key", input.audio_key)?,
                    output_key: required("output_key", input.output_key)?,
                    generation_api_token: required(
                        "generation_api_token",
                        input.generation_api_token,
                    )?,
                    video_url: non_empty(input.video_url),
                    chunk_duration: parse_chunk_duration(input.chunk_duration.as_ref())?,
                };
                if mode == JobMode::GenerateAndStitch {
                    JobTask::GenerateAndStitch(task)
                } else {
                    JobTask::GenerateAndStitchBatch(task)
                }
            }
        };

        Ok(Self { credentials, task })
    }

    pub fn mode(&self) -> JobMode {
        self.task.mode()
    }
}

/// Whole seconds, at least 1. `chunk_duration` is only read by the modes
/// that split or trim audio.
fn parse_chunk_duration(value: Option<&serde_json::Number>) -> ValidationResult<u32> {
    let Some(number) = value else {
        return Ok(DEFAULT_CHUNK_DURATION);
    };

    let seconds = match (number.as_u64(), number.as_f64()) {
        (Some(secs), _) => Some(secs),
        (None, Some(secs)) if secs.fract() == 0.0 && secs >= 0.0 && secs <= u32::MAX as f64 => {
            Some(secs as u64)
        }
        _ => None,
    };

    match seconds {
        Some(secs) if secs >= 1 && secs <= u32::MAX as u64 => Ok(secs as u32),
        _ => Err(ValidationError::invalid(
            "chunk_duration",
            format!("expected a positive whole number of seconds, got {}", number),
        )),
    }
}
