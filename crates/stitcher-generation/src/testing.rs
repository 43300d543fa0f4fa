//! Scripted [`GenerationApi`] for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::GenerationApi;
use crate::error::{GenerationError, GenerationResult};
use crate::types::{Prediction, PredictionRequest};

pub(crate) struct ScriptedApi {
    polls: Mutex<VecDeque<Value>>,
    repeat_last: bool,
    create_failures: Mutex<VecDeque<Option<Duration>>>,
    get_calls: AtomicU32,
    create_calls: AtomicU32,
    submitted: Mutex<Vec<(tokio::time::Instant, String)>>,
}

impl ScriptedApi {
    fn build(polls: Vec<Value>, repeat_last: bool) -> Self {
        Self {
            polls: Mutex::new(polls.into()),
            repeat_last,
            create_failures: Mutex::new(VecDeque::new()),
            get_calls: AtomicU32::new(0),
            create_calls: AtomicU32::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Answer polls with `statuses` in order.
    pub fn with_statuses(statuses: Vec<Value>) -> Self {
        Self::build(statuses, false)
    }

    /// Answer every poll with `status`.
    pub fn always(status: Value) -> Self {
        Self::build(vec![status], true)
    }

    /// Script create outcomes: `Some(wait)` is a 429, `None` a success.
    pub fn with_create_script(self, script: Vec<Option<Duration>>) -> Self {
        *self.create_failures.lock().unwrap() = script.into();
        self
    }

    pub fn get_calls(&self) -> u32 {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Successful submissions: when and for which audio URL.
    pub fn submitted(&self) -> Vec<(tokio::time::Instant, String)> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationApi for ScriptedApi {
    async fn latest_version(&self, _model: &str) -> GenerationResult<String> {
        Ok("v-test".to_string())
    }

    async fn create_prediction(&self, request: &PredictionRequest) -> GenerationResult<Prediction> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(Some(retry_after)) = self.create_failures.lock().unwrap().pop_front() {
            return Err(GenerationError::RateLimited { retry_after });
        }

        self.submitted
            .lock()
            .unwrap()
            .push((tokio::time::Instant::now(), request.input.audio_file.clone()));
        Ok(serde_json::from_value(json!({"id": format!("pred-{n}"), "status": "starting"}))?)
    }

    async fn get_prediction(&self, id: &str) -> GenerationResult<Prediction> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let mut polls = self.polls.lock().unwrap();
        let next = if self.repeat_last && polls.len() == 1 {
            polls.front().cloned()
        } else {
            polls.pop_front()
        };
        match next {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Err(GenerationError::api(404, format!("no script left for {id}"))),
        }
    }
}
