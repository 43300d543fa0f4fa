//! Generation client error types.

use std::time::Duration;

use thiserror::Error;

pub type GenerationResult<T> = Result<T, GenerationError>;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generation API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Rate limited; retry after {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("Prediction {id} failed: {message}")]
    PredictionFailed { id: String, message: String },

    #[error("Prediction {id} was canceled")]
    Canceled { id: String },

    #[error("Prediction {id} did not finish after {attempts} polls")]
    Timeout { id: String, attempts: u32 },

    #[error("Prediction {id} returned unexpected output: {output}")]
    UnexpectedOutput { id: String, output: String },

    #[error("Model {0} has no published version")]
    MissingVersion(String),

    #[error("Invalid model reference '{0}', expected owner/name")]
    InvalidModel(String),

    #[error("Client configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GenerationError::RateLimited { .. })
    }
}
