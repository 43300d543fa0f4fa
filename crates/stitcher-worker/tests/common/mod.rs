//! In-memory collaborators for pipeline tests.
//!
//! Every fake appends to one shared event log so tests can assert on the
//! order of calls across collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use stitcher_generation::{
    GenerationApi, GenerationResult, Prediction, PredictionRequest, PredictionStatus,
};
use stitcher_media::{
    MediaError, MediaInfo, MediaResult, MediaToolkit, MuxOptions, VideoFormat, VideoStream,
};
use stitcher_models::StoreCredentials;
use stitcher_storage::{BlobStore, StorageError, StorageResult, UrlFetcher};
use stitcher_worker::{Backends, Pipeline, WorkerConfig, WorkerResult};

pub const PUBLIC_BASE: &str = "https://cdn.test";

#[derive(Debug, Clone, Default)]
pub struct Events(Arc<Mutex<Vec<String>>>);

impl Events {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Events starting with `prefix`.
    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.all()
            .into_iter()
            .filter(|e| e.starts_with(prefix))
            .collect()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.all().iter().position(|e| e == event)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn touch(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, b"fake media")
}

pub struct FakeStore {
    events: Events,
    missing: Vec<String>,
}

#[async_trait]
impl BlobStore for FakeStore {
    async fn download_file(&self, key: &str, path: &Path) -> StorageResult<()> {
        self.events.push(format!("download {}", key));
        if self.missing.iter().any(|m| m == key) {
            return Err(StorageError::not_found(key));
        }
        touch(path)?;
        Ok(())
    }

    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        if !path.exists() {
            return Err(StorageError::upload_failed(format!(
                "{} does not exist",
                path.display()
            )));
        }
        self.events
            .push(format!("upload {} {}", key, content_type));
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", PUBLIC_BASE, key)
    }
}

/// HEAD checks fail for URLs containing any of `unreachable`.
pub struct FakeFetcher {
    events: Events,
    unreachable: Vec<String>,
}

#[async_trait]
impl UrlFetcher for FakeFetcher {
    async fn download(&self, url: &str, path: &Path) -> StorageResult<()> {
        self.events
            .push(format!("fetch {} -> {}", url, file_name(path)));
        touch(path)?;
        Ok(())
    }

    async fn is_reachable(&self, url: &str) -> bool {
        self.events.push(format!("head {}", url));
        !self.unreachable.iter().any(|part| url.contains(part.as_str()))
    }
}

/// Durations are looked up by file name. Every produced file is created
/// on disk so later steps and uploads find it.
pub struct FakeMedia {
    events: Events,
    durations: HashMap<String, f64>,
    widths: Vec<u32>,
    fail_mux: Option<String>,
}

impl FakeMedia {
    fn duration_of(&self, file: &Path) -> MediaResult<f64> {
        self.durations
            .get(&file_name(file))
            .copied()
            .ok_or_else(|| MediaError::invalid_media(format!("{} has no usable duration", file.display())))
    }
}

#[async_trait]
impl MediaToolkit for FakeMedia {
    async fn probe_duration(&self, file: &Path) -> MediaResult<f64> {
        self.events.push(format!("probe {}", file_name(file)));
        self.duration_of(file)
    }

    async fn probe_streams(&self, file: &Path) -> MediaResult<MediaInfo> {
        let name = file_name(file);
        self.events.push(format!("streams {}", name));
        let index: usize = name
            .trim_start_matches("chunk_")
            .trim_end_matches(".mp4")
            .parse()
            .unwrap_or(0);
        let width = self.widths.get(index).copied().unwrap_or(720);
        Ok(MediaInfo {
            duration: 5.0,
            video: Some(VideoStream {
                codec: "h264".into(),
                width,
                height: 1280,
                fps: 25.0,
            }),
            audio: None,
            size: 1024,
        })
    }

    async fn segment(
        &self,
        file: &Path,
        seconds: u32,
        out_dir: &Path,
        prefix: &str,
    ) -> MediaResult<Vec<PathBuf>> {
        self.events.push(format!("segment {} {}", file_name(file), seconds));
        let total = self.duration_of(file)?;
        let count = (total / seconds as f64).ceil() as usize;
        let ext = file
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut pieces = Vec::with_capacity(count);
        for i in 0..count {
            let piece = out_dir.join(format!("{}_{:03}.{}", prefix, i, ext));
            touch(&piece)?;
            pieces.push(piece);
        }
        Ok(pieces)
    }

    async fn concat(&self, files: &[PathBuf], output: &Path, reencode: bool) -> MediaResult<()> {
        let names: Vec<String> = files.iter().map(|f| file_name(f)).collect();
        self.events.push(format!(
            "concat [{}] {} -> {}",
            names.join(","),
            if reencode { "reencode" } else { "copy" },
            file_name(output)
        ));
        touch(output)?;
        Ok(())
    }

    async fn concat_normalized(
        &self,
        files: &[PathBuf],
        output: &Path,
        format: &VideoFormat,
    ) -> MediaResult<()> {
        let names: Vec<String> = files.iter().map(|f| file_name(f)).collect();
        self.events.push(format!(
            "concat_normalized [{}] {} -> {}",
            names.join(","),
            format,
            file_name(output)
        ));
        touch(output)?;
        Ok(())
    }

    async fn mux(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        options: MuxOptions,
    ) -> MediaResult<()> {
        self.events.push(format!(
            "mux {} {} reencode={} -> {}",
            file_name(video),
            file_name(audio),
            options.reencode_video,
            file_name(output)
        ));
        if let Some(stderr) = &self.fail_mux {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(stderr.clone()),
                Some(1),
            ));
        }
        touch(output)?;
        Ok(())
    }

    async fn trim(
        &self,
        file: &Path,
        output: &Path,
        max_seconds: f64,
        reencode: bool,
    ) -> MediaResult<()> {
        self.events.push(format!(
            "trim {} {:.2} {} -> {}",
            file_name(file),
            max_seconds,
            if reencode { "reencode" } else { "copy" },
            file_name(output)
        ));
        touch(output)?;
        Ok(())
    }
}

/// How a fake prediction ends once its pending polls are used up.
#[derive(Debug, Clone, Default)]
pub enum Finish {
    #[default]
    Succeed,
    Fail(String),
    Cancel,
    /// Succeeds with this raw `output` value.
    Output(serde_json::Value),
    /// Stays `processing` forever.
    Never,
}

/// Predictions stay `processing` for `pending_polls` fetches, then end
/// as `finish` says.
pub struct FakeGeneration {
    events: Events,
    pending_polls: u32,
    finish: Finish,
    created: Mutex<u32>,
    polls: Mutex<HashMap<String, u32>>,
}

pub fn output_url_for(id: &str) -> String {
    format!("https://replicate.delivery/{}/output.mp4", id)
}

#[async_trait]
impl GenerationApi for FakeGeneration {
    async fn latest_version(&self, model: &str) -> GenerationResult<String> {
        self.events.push(format!("version {}", model));
        Ok("v-latest".to_string())
    }

    async fn create_prediction(&self, request: &PredictionRequest) -> GenerationResult<Prediction> {
        let id = {
            let mut created = self.created.lock().unwrap();
            *created += 1;
            format!("pred-{}", *created)
        };
        self.events.push(format!(
            "create {} video={} audio={}",
            request.version, request.input.video_url, request.input.audio_file
        ));
        Ok(Prediction {
            id,
            status: PredictionStatus::Starting,
            output: None,
            error: None,
        })
    }

    async fn get_prediction(&self, id: &str) -> GenerationResult<Prediction> {
        self.events.push(format!("get {}", id));
        let seen = {
            let mut polls = self.polls.lock().unwrap();
            let seen = polls.entry(id.to_string()).or_insert(0);
            *seen += 1;
            *seen
        };

        let mut prediction = Prediction {
            id: id.to_string(),
            status: PredictionStatus::Processing,
            output: None,
            error: None,
        };
        if seen <= self.pending_polls {
            return Ok(prediction);
        }

        match &self.finish {
            Finish::Succeed => {
                prediction.status = PredictionStatus::Succeeded;
                prediction.output = Some(serde_json::Value::String(output_url_for(id)));
            }
            Finish::Fail(message) => {
                prediction.status = PredictionStatus::Failed;
                prediction.error = Some(serde_json::Value::String(message.clone()));
            }
            Finish::Cancel => prediction.status = PredictionStatus::Canceled,
            Finish::Output(value) => {
                prediction.status = PredictionStatus::Succeeded;
                prediction.output = Some(value.clone());
            }
            Finish::Never => {}
        }
        Ok(prediction)
    }
}

/// Builder for a full set of fakes.
pub struct FakeWorld {
    pub events: Events,
    pub missing_keys: Vec<String>,
    pub durations: HashMap<String, f64>,
    pub chunk_widths: Vec<u32>,
    pub fail_mux: Option<String>,
    pub unreachable: Vec<String>,
    pub pending_polls: u32,
    pub finish: Finish,
}

impl Default for FakeWorld {
    fn default() -> Self {
        Self {
            events: Events::default(),
            missing_keys: Vec::new(),
            durations: HashMap::new(),
            chunk_widths: Vec::new(),
            fail_mux: None,
            unreachable: Vec::new(),
            pending_polls: 1,
            finish: Finish::Succeed,
        }
    }
}

impl FakeWorld {
    pub fn with_duration(mut self, file_name: &str, seconds: f64) -> Self {
        self.durations.insert(file_name.to_string(), seconds);
        self
    }

    pub fn backends(self) -> (Arc<FakeBackends>, Events) {
        let events = self.events.clone();
        let backends = FakeBackends {
            store: Arc::new(FakeStore {
                events: events.clone(),
                missing: self.missing_keys,
            }),
            fetcher: Arc::new(FakeFetcher {
                events: events.clone(),
                unreachable: self.unreachable,
            }),
            media: Arc::new(FakeMedia {
                events: events.clone(),
                durations: self.durations,
                widths: self.chunk_widths,
                fail_mux: self.fail_mux,
            }),
            generation: Arc::new(FakeGeneration {
                events: events.clone(),
                pending_polls: self.pending_polls,
                finish: self.finish,
                created: Mutex::new(0),
                polls: Mutex::new(HashMap::new()),
            }),
            events: events.clone(),
        };
        (Arc::new(backends), events)
    }
}

pub struct FakeBackends {
    store: Arc<FakeStore>,
    fetcher: Arc<FakeFetcher>,
    media: Arc<FakeMedia>,
    generation: Arc<FakeGeneration>,
    events: Events,
}

impl Backends for FakeBackends {
    fn blob_store(&self, credentials: &StoreCredentials) -> WorkerResult<Arc<dyn BlobStore>> {
        self.events
            .push(format!("blob_store {}", credentials.bucket_name));
        Ok(self.store.clone())
    }

    fn generation(&self, _token: &str) -> WorkerResult<Arc<dyn GenerationApi>> {
        self.events.push("generation_client");
        Ok(self.generation.clone())
    }

    fn fetcher(&self) -> Arc<dyn UrlFetcher> {
        self.fetcher.clone()
    }

    fn media(&self) -> Arc<dyn MediaToolkit> {
        self.media.clone()
    }
}

/// Config with a scratch root under `root` and near-instant polling.
pub fn test_config(root: &Path) -> WorkerConfig {
    WorkerConfig {
        work_dir: root.to_path_buf(),
        poll_interval: Duration::from_millis(1),
        batch_pause: Duration::from_millis(1),
        max_polls_single: 5,
        max_polls_batch: 5,
        ..WorkerConfig::default()
    }
}

pub fn pipeline(root: &Path, backends: Arc<FakeBackends>) -> Pipeline {
    Pipeline::new(test_config(root), backends)
}

/// Event with valid credentials merged with `fields`.
pub fn event(fields: serde_json::Value) -> serde_json::Value {
    let mut input = serde_json::json!({
        "r2_account_id": "acc123",
        "r2_access_key_id": "AKIAEXAMPLE",
        "r2_secret_access_key": "s3cr3t",
        "r2_bucket_name": "santagram-media",
        "r2_public_url": PUBLIC_BASE,
    });
    if let (Some(base), Some(extra)) = (input.as_object_mut(), fields.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    serde_json::json!({ "input": input })
}

/// Entries left under the scratch root.
pub fn leftover_entries(root: &Path) -> usize {
    std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
}
