//! Replicate HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use crate::api::GenerationApi;
use crate::error::{GenerationError, GenerationResult};
use crate::types::{ModelResponse, Prediction, PredictionRequest};

/// Wait applied to a 429 without a usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

/// Configuration for the Replicate client.
#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.replicate.com/v1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ReplicateConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

/// Client for the Replicate predictions API, authenticated with one token.
pub struct ReplicateClient {
    http: Client,
    config: ReplicateConfig,
    token: String,
}

impl ReplicateClient {
    pub fn new(config: ReplicateConfig, token: impl Into<String>) -> GenerationResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(GenerationError::Config("API token is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GenerationError::Network)?;

        Ok(Self {
            http,
            config,
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    async fn check(response: Response) -> GenerationResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after(&response).unwrap_or(DEFAULT_RETRY_AFTER);
            warn!(retry_after_secs = retry_after.as_secs(), "Generation API rate limited");
            return Err(GenerationError::RateLimited { retry_after });
        }

        let body = response.text().await.unwrap_or_default();
        Err(GenerationError::api(status.as_u16(), body))
    }
}

/// `Retry-After` in delta-seconds form.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Split `owner/name`.
fn split_model(model: &str) -> GenerationResult<(&str, &str)> {
    match model.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        }
        _ => Err(GenerationError::InvalidModel(model.to_string())),
    }
}

#[async_trait]
impl GenerationApi for ReplicateClient {
    async fn latest_version(&self, model: &str) -> GenerationResult<String> {
        let (owner, name) = split_model(model)?;
        let url = self.url(&format!("models/{}/{}", owner, name));
        debug!("Resolving latest version of {}", model);

        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;
        let body: ModelResponse = Self::check(response).await?.json().await?;

        body.latest_version
            .map(|v| v.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GenerationError::MissingVersion(model.to_string()))
    }

    async fn create_prediction(&self, request: &PredictionRequest) -> GenerationResult<Prediction> {
        let url = self.url("predictions");
        debug!(audio = %request.input.audio_file, "Creating prediction");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;

        let prediction: Prediction = Self::check(response).await?.json().await?;
        debug!(id = %prediction.id, "Prediction created");
        Ok(prediction)
    }

    async fn get_prediction(&self, id: &str) -> GenerationResult<Prediction> {
        let url = self.url(&format!("predictions/{}", id));

        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }
}
