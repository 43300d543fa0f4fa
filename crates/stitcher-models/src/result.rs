//! Terminal pipeline results.

use serde::{Deserialize, Serialize};

/// Final status reported for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    Completed,
    Failed,
}

/// Output of the video-producing modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoOutput {
    pub video_url: String,
    pub output_key: String,
    /// Remote generation jobs that contributed to the video
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prediction_ids: Vec<String>,
}

/// Output of the audio split mode, in segment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunksOutput {
    pub chunk_urls: Vec<String>,
    pub chunk_keys: Vec<String>,
}

/// Mode-specific output payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobOutput {
    Video(VideoOutput),
    Chunks(ChunksOutput),
}

/// Result returned exactly once per job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<JobOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineResult {
    pub fn completed(output: JobOutput) -> Self {
        Self {
            status: ResultStatus::Completed,
            output: Some(output),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Failed,
            output: None,
            error: Some(error.into()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ResultStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_completed_serialization() {
        let result = PipelineResult::completed(JobOutput::Video(VideoOutput {
            video_url: "https://cdn.example.com/out.mp4".into(),
            output_key: "out.mp4".into(),
            prediction_ids: vec![],
        }));

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "status": "COMPLETED",
                "output": {
                    "video_url": "https://cdn.example.com/out.mp4",
                    "output_key": "out.mp4"
                }
            })
        );
    }

    #[test]
    fn test_failed_serialization() {
        let result = PipelineResult::failed("ffmpeg error: boom");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "status": "FAILED", "error": "ffmpeg error: boom" })
        );
        assert!(!result.is_completed());
    }

    #[test]
    fn test_chunks_output_round_trips_untagged() {
        let value = json!({
            "status": "COMPLETED",
            "output": { "chunk_urls": ["u1"], "chunk_keys": ["k1"] }
        });
        let parsed: PipelineResult = serde_json::from_value(value).unwrap();
        assert!(matches!(parsed.output, Some(JobOutput::Chunks(_))));
    }
}
