//! Client for the Replicate lip-sync generation API.
//!
//! Submits predictions, polls them to a terminal state with a bounded
//! attempt budget, and rate-limits batch submission.

pub mod api;
pub mod batch;
pub mod client;
pub mod error;
pub mod poll;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use api::GenerationApi;
pub use batch::BatchSubmitter;
pub use client::{ReplicateClient, ReplicateConfig, DEFAULT_RETRY_AFTER};
pub use error::{GenerationError, GenerationResult};
pub use poll::{classify, poll_all, poll_until_terminal, PollPolicy, PollStep};
pub use types::{LipSyncInput, Prediction, PredictionRequest, PredictionStatus};
