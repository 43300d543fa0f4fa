//! The generation service as the pipeline sees it.

use async_trait::async_trait;

use crate::error::GenerationResult;
use crate::types::{Prediction, PredictionRequest};

#[async_trait]
pub trait GenerationApi: Send + Sync {
    /// Latest published version id of `model` (`owner/name`).
    async fn latest_version(&self, model: &str) -> GenerationResult<String>;

    /// Submit a prediction. A 429 surfaces as `RateLimited`.
    async fn create_prediction(&self, request: &PredictionRequest) -> GenerationResult<Prediction>;

    /// Current state of a prediction.
    async fn get_prediction(&self, id: &str) -> GenerationResult<Prediction>;
}
