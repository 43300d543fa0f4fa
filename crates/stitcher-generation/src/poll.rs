//! Bounded polling of predictions until they reach a terminal state.

use std::time::Duration;

use metrics::counter;
use tracing::{debug, info};

use crate::api::GenerationApi;
use crate::error::{GenerationError, GenerationResult};
use crate::types::{Prediction, PredictionStatus};

/// Poll attempts made, labelled by outcome.
pub const METRIC_POLL_ATTEMPTS: &str = "stitcher_generation_poll_attempts_total";

/// How often and how long to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    /// One long prediction: 300 polls, 25 minutes at the default interval.
    pub fn single_job() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, 300)
    }

    /// One prediction per chunk: 120 polls each.
    pub fn batch() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, 120)
    }
}

/// What one observation of a prediction means for the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Still running; wait and look again.
    Pending,
    /// Finished with this output URL.
    Done(String),
}

/// Classify one observation. Failed and canceled predictions are errors.
pub fn classify(prediction: &Prediction) -> GenerationResult<PollStep> {
    match &prediction.status {
        PredictionStatus::Succeeded => prediction.output_url().map(PollStep::Done),
        PredictionStatus::Failed => Err(GenerationError::PredictionFailed {
            id: prediction.id.clone(),
            message: prediction.error_message(),
        }),
        PredictionStatus::Canceled => Err(GenerationError::Canceled {
            id: prediction.id.clone(),
        }),
        PredictionStatus::Starting | PredictionStatus::Processing | PredictionStatus::Other(_) => {
            Ok(PollStep::Pending)
        }
    }
}

/// Poll `id` until it succeeds, fails, or `policy.max_attempts` fetches
/// have seen it still running.
pub async fn poll_until_terminal<A>(api: &A, id: &str, policy: &PollPolicy) -> GenerationResult<String>
where
    A: GenerationApi + ?Sized,
{
    let mut attempt = 0;

    while attempt < policy.max_attempts {
        attempt += 1;
        let prediction = api.get_prediction(id).await?;

        match classify(&prediction) {
            Ok(PollStep::Done(url)) => {
                counter!(METRIC_POLL_ATTEMPTS, "outcome" => "succeeded").increment(attempt as u64);
                info!(prediction_id = id, attempts = attempt, "Prediction succeeded");
                return Ok(url);
            }
            Ok(PollStep::Pending) => {
                debug!(
                    prediction_id = id,
                    attempt,
                    max_attempts = policy.max_attempts,
                    status = prediction.status.as_str(),
                    "Prediction still running"
                );
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.interval).await;
                }
            }
            Err(e) => {
                counter!(METRIC_POLL_ATTEMPTS, "outcome" => "failed").increment(attempt as u64);
                return Err(e);
            }
        }
    }

    counter!(METRIC_POLL_ATTEMPTS, "outcome" => "timeout").increment(attempt as u64);
    Err(GenerationError::Timeout {
        id: id.to_string(),
        attempts: attempt,
    })
}

/// Poll each id in turn; outputs come back in id order.
pub async fn poll_all<A>(api: &A, ids: &[String], policy: &PollPolicy) -> GenerationResult<Vec<String>>
where
    A: GenerationApi + ?Sized,
{
    let mut outputs = Vec::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        debug!(prediction_id = %id, position = i + 1, total = ids.len(), "Waiting for prediction");
        outputs.push(poll_until_terminal(api, id, policy).await?);
    }
    Ok(outputs)
}
