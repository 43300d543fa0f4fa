//! Replicate request/response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GenerationError, GenerationResult};

/// Inputs of the lip-sync model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LipSyncInput {
    /// Video whose mouth movements are re-synthesized
    pub video_url: String,
    /// Speech driving the lip movement
    pub audio_file: String,
}

/// Body of `POST /predictions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub version: String,
    pub input: LipSyncInput,
}

impl PredictionRequest {
    pub fn lip_sync(
        version: impl Into<String>,
        video_url: impl Into<String>,
        audio_url: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            input: LipSyncInput {
                video_url: video_url.into(),
                audio_file: audio_url.into(),
            },
        }
    }
}

/// Lifecycle state of a prediction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum PredictionStatus {
    #[default]
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    /// Any status this client does not know; treated as still running.
    Other(String),
}

impl PredictionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Starting => "starting",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for PredictionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "starting" => Self::Starting,
            "processing" => Self::Processing,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            "canceled" => Self::Canceled,
            _ => Self::Other(value),
        }
    }
}

/// A remote generation job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    pub id: String,
    #[serde(default)]
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl Prediction {
    /// URL of the generated media.
    ///
    /// Accepts a string or a non-empty list whose first element is a string.
    pub fn output_url(&self) -> GenerationResult<String> {
        let url = match &self.output {
            Some(Value::String(s)) => Some(s.as_str()),
            Some(Value::Array(items)) => items.first().and_then(Value::as_str),
            _ => None,
        };

        match url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(u) => Ok(u.to_string()),
            None => Err(GenerationError::UnexpectedOutput {
                id: self.id.clone(),
                output: self
                    .output
                    .as_ref()
                    .map(Value::to_string)
                    .unwrap_or_else(|| "null".to_string()),
            }),
        }
    }

    /// Remote error text, if any.
    pub fn error_message(&self) -> String {
        match &self.error {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Null) | None => "no error message".to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// `GET /models/{owner}/{name}` response, reduced to what is used.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ModelResponse {
    #[serde(default)]
    pub latest_version: Option<ModelVersion>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ModelVersion {
    pub id: String,
}
