//! One-shot worker: reads a job event from stdin and prints its result.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

use stitcher_models::PipelineResult;
use stitcher_worker::{init_tracing, LiveBackends, LogTarget, Pipeline, WorkerConfig};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed");
    }

    dotenvy::dotenv().ok();

    // stdout is reserved for the result line
    init_tracing(LogTarget::Stderr);

    let (result, code) = match run().await {
        Ok(result) => (result, 0),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            (PipelineResult::failed(format!("Fatal error: {:#}", e)), 1)
        }
    };

    match serde_json::to_string(&result) {
        Ok(line) => println!("{}", line),
        Err(e) => {
            eprintln!("failed to serialize result: {}", e);
            std::process::exit(1);
        }
    }

    std::process::exit(code);
}

async fn run() -> anyhow::Result<PipelineResult> {
    let config = WorkerConfig::from_env();
    config.validate()?;
    info!("Worker config: {:?}", config);

    let mut raw = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .context("reading event from stdin")?;
    let event: serde_json::Value =
        serde_json::from_str(&raw).context("event is not valid JSON")?;

    let backends = LiveBackends::new(&config)?;
    let pipeline = Pipeline::new(config, Arc::new(backends));

    Ok(pipeline.handle_event(event).await)
}
