//! Lip-sync stitcher worker.
//!
//! This crate provides:
//! - The job pipeline and its four modes
//! - Collaborator construction for production runs
//! - Worker configuration, logging and metrics
//! - The HTTP adapter used by `stitcher-server`

pub mod backends;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod server;
pub mod workdir;

pub use backends::{Backends, LiveBackends};
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::{init_tracing, JobLogger, LogTarget};
pub use pipeline::Pipeline;
pub use server::create_router;
pub use workdir::WorkDir;
