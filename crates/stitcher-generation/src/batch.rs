//! Rate-limited submission of many predictions.

use std::time::Duration;

use metrics::counter;
use tracing::{info, warn};

use crate::api::GenerationApi;
use crate::error::{GenerationError, GenerationResult};
use crate::types::PredictionRequest;

/// Predictions submitted, including retried ones.
pub const METRIC_PREDICTIONS_SUBMITTED: &str = "stitcher_generation_predictions_submitted_total";

/// Submits predictions in order, pausing between bursts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSubmitter {
    burst: usize,
    pause: Duration,
}

impl Default for BatchSubmitter {
    fn default() -> Self {
        Self {
            burst: 5,
            pause: Duration::from_secs(2),
        }
    }
}

impl BatchSubmitter {
    pub fn new(burst: usize, pause: Duration) -> Self {
        Self {
            burst: burst.max(1),
            pause,
        }
    }

    /// Submit every request and return prediction ids in request order.
    ///
    /// A rate-limited submission is retried once after the server's wait.
    pub async fn submit_all<A>(&self, api: &A, requests: &[PredictionRequest]) -> GenerationResult<Vec<String>>
    where
        A: GenerationApi + ?Sized,
    {
        let total = requests.len();
        let mut ids = Vec::with_capacity(total);

        for (i, request) in requests.iter().enumerate() {
            let prediction = match api.create_prediction(request).await {
                Err(GenerationError::RateLimited { retry_after }) => {
                    warn!(
                        position = i + 1,
                        retry_after_secs = retry_after.as_secs(),
                        "Submission rate limited, retrying once"
                    );
                    tokio::time::sleep(retry_after).await;
                    api.create_prediction(request).await?
                }
                other => other?,
            };

            counter!(METRIC_PREDICTIONS_SUBMITTED).increment(1);
            info!(prediction_id = %prediction.id, position = i + 1, total, "Prediction submitted");
            ids.push(prediction.id);

            let submitted = i + 1;
            if submitted % self.burst == 0 && submitted < total {
                info!(pause_ms = self.pause.as_millis() as u64, "Pausing between submission bursts");
                tokio::time::sleep(self.pause).await;
            }
        }

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedApi;
    use serde_json::json;

    fn requests(n: usize) -> Vec<PredictionRequest> {
        (1..=n)
            .map(|i| PredictionRequest::lip_sync("v", "https://hero.mp4", format!("https://a/{i}.mp3")))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_pauses_between_bursts() {
        let api = ScriptedApi::always(json!({"id": "x", "status": "starting"}));
        let start = tokio::time::Instant::now();

        let ids = BatchSubmitter::default()
            .submit_all(&api, &requests(7))
            .await
            .unwrap();

        assert_eq!(ids, (1..=7).map(|n| format!("pred-{n}")).collect::<Vec<_>>());

        let times: Vec<Duration> = api.submitted().iter().map(|(t, _)| *t - start).collect();
        assert!(times[..5].iter().all(|t| *t == Duration::ZERO));
        assert!(times[5..].iter().all(|t| *t == Duration::from_secs(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_pause_after_last_burst() {
        let api = ScriptedApi::always(json!({"id": "x", "status": "starting"}));
        let start = tokio::time::Instant::now();

        BatchSubmitter::default()
            .submit_all(&api, &requests(5))
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retried_once() {
        let api = ScriptedApi::always(json!({"id": "x", "status": "starting"}))
            .with_create_script(vec![None, Some(Duration::from_secs(7))]);
        let start = tokio::time::Instant::now();

        let ids = BatchSubmitter::default()
            .submit_all(&api, &requests(2))
            .await
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(api.create_calls(), 3);
        let submitted = api.submitted();
        assert_eq!(submitted[1].1, "https://a/2.mp3");
        assert_eq!(submitted[1].0 - start, Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_rate_limit_fails() {
        let api = ScriptedApi::always(json!({"id": "x", "status": "starting"})).with_create_script(vec![
            Some(Duration::from_secs(1)),
            Some(Duration::from_secs(1)),
        ]);

        let err = BatchSubmitter::default()
            .submit_all(&api, &requests(1))
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(api.create_calls(), 2);
    }
}
