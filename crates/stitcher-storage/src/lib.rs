//! Object storage for the stitcher worker.
//!
//! This crate provides:
//! - An R2 (S3 API) client bound to per-job credentials
//! - Public URL derivation for stored keys
//! - A plain HTTP fetcher for external media URLs
//! - Content type helpers for uploads

pub mod client;
pub mod content_type;
pub mod error;
pub mod fetch;
pub mod public_url;
pub mod store;

pub use client::{R2Client, R2Config, DEFAULT_CONNECT_TIMEOUT, DEFAULT_OPERATION_TIMEOUT};
pub use content_type::{content_type_for, extension_or, DEFAULT_AUDIO_EXTENSION};
pub use error::{StorageError, StorageResult};
pub use fetch::{FetchConfig, HttpFetcher, UrlFetcher, MAX_DOWNLOAD_BYTES};
pub use public_url::{normalize_base_url, PublicUrlBuilder};
pub use store::BlobStore;
