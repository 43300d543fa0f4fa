//! R2 client implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use stitcher_models::StoreCredentials;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::public_url::PublicUrlBuilder;
use crate::store::BlobStore;

/// Configuration for R2 client.
#[derive(Debug, Clone)]
pub struct R2Config {
    /// R2 endpoint URL (S3 API endpoint)
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region (usually "auto" for R2)
    pub region: String,
    /// Deadline for establishing a connection
    pub connect_timeout: Duration,
    /// Deadline for a whole GET or PUT, body transfer included
    pub operation_timeout: Duration,
}

/// Default connect deadline.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default deadline for one transfer.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(300);

impl R2Config {
    /// Build config from per-job credentials.
    pub fn from_credentials(credentials: &StoreCredentials) -> Self {
        Self {
            endpoint_url: credentials.endpoint_url(),
            access_key_id: credentials.access_key_id.clone(),
            secret_access_key: credentials.secret_access_key.clone(),
            bucket_name: credentials.bucket_name.clone(),
            region: "auto".to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }
}

/// Cloudflare R2 storage client bound to one bucket.
#[derive(Clone)]
pub struct R2Client {
    client: Client,
    bucket: String,
    urls: PublicUrlBuilder,
    operation_timeout: Duration,
}

impl R2Client {
    /// Create a new R2 client from configuration.
    pub fn new(config: R2Config, urls: PublicUrlBuilder) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2",
        );

        let timeouts = TimeoutConfig::builder()
            .connect_timeout(config.connect_timeout)
            .operation_attempt_timeout(config.operation_timeout)
            .operation_timeout(config.operation_timeout)
            .build();

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .timeout_config(timeouts)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            urls,
            operation_timeout: config.operation_timeout,
        }
    }

    /// Create a client for the bucket named in job credentials, with
    /// `operation_timeout` bounding each transfer.
    pub fn from_credentials(
        credentials: &StoreCredentials,
        operation_timeout: Duration,
    ) -> StorageResult<Self> {
        let urls = PublicUrlBuilder::from_credentials(credentials)?;
        let config = R2Config::from_credentials(credentials).with_operation_timeout(operation_timeout);
        Ok(Self::new(config, urls))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl BlobStore for R2Client {
    async fn download_file(&self, key: &str, path: &Path) -> StorageResult<()> {
        debug!("Downloading {} to {}", key, path.display());

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|s| s.is_no_such_key()).unwrap_or(false) {
                    StorageError::not_found(key)
                } else {
                    StorageError::download_failed(format!("{}: {}", key, e))
                }
            })?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // The SDK deadline ends once headers arrive; the body gets its own.
        let mut reader = response.body.into_async_read();
        let mut file = tokio::fs::File::create(path).await?;
        let bytes = tokio::time::timeout(self.operation_timeout, tokio::io::copy(&mut reader, &mut file))
            .await
            .map_err(|_| {
                StorageError::download_failed(format!(
                    "{}: body not received within {}s",
                    key,
                    self.operation_timeout.as_secs()
                ))
            })??;
        file.flush().await?;

        info!(bytes, "Downloaded {} to {}", key, path.display());
        Ok(())
    }

    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", path.display(), e)))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", key, e)))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        self.urls.url_for(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> StoreCredentials {
        StoreCredentials::from_parts(
            Some("acc42".into()),
            Some("AKID".into()),
            Some("secret".into()),
            Some("media".into()),
            Some("cdn.example.app".into()),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_config_from_credentials() {
        let config = R2Config::from_credentials(&credentials());
        assert_eq!(config.endpoint_url, "https://acc42.r2.cloudflarestorage.com");
        assert_eq!(config.bucket_name, "media");
        assert_eq!(config.region, "auto");
        assert_eq!(config.operation_timeout, DEFAULT_OPERATION_TIMEOUT);

        let config = config.with_operation_timeout(Duration::from_secs(42));
        assert_eq!(config.operation_timeout, Duration::from_secs(42));
    }

    #[tokio::test]
    async fn test_stalled_download_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/media/audio/voice.mp3"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late".to_vec())
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let mut config = R2Config::from_credentials(&credentials())
            .with_operation_timeout(Duration::from_millis(300));
        config.endpoint_url = server.uri();
        let urls = PublicUrlBuilder::from_credentials(&credentials()).unwrap();
        let client = R2Client::new(config, urls);

        let dir = tempfile::tempdir().unwrap();
        let started = std::time::Instant::now();
        let err = client
            .download_file("audio/voice.mp3", &dir.path().join("voice.mp3"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::DownloadFailed(_)), "{:?}", err);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_client_public_url() {
        let client = R2Client::from_credentials(&credentials(), DEFAULT_OPERATION_TIMEOUT).unwrap();
        assert_eq!(client.bucket(), "media");
        assert_eq!(
            client.public_url("final/out.mp4"),
            "https://cdn.example.app/final/out.mp4"
        );
    }
}
