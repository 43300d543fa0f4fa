//! Plain HTTP(S) fetches: fallback videos, generated clips and reachability
//! probes of public object URLs.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};

/// Downloads larger than this are refused.
pub const MAX_DOWNLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// Fetches arbitrary URLs to local files.
#[async_trait]
pub trait UrlFetcher: Send + Sync {
    /// Stream `url` into `path`.
    async fn download(&self, url: &str, path: &Path) -> StorageResult<()>;

    /// HEAD `url` and report whether it answered with a success status.
    async fn is_reachable(&self, url: &str) -> bool;
}

/// Timeouts and limits for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub download_timeout: Duration,
    pub head_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            download_timeout: Duration::from_secs(300),
            head_timeout: Duration::from_secs(10),
            max_bytes: MAX_DOWNLOAD_BYTES,
        }
    }
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> StorageResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| StorageError::config_error(format!("HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

/// Parse `url`, allowing only http and https.
pub fn validate_fetch_url(url: &str) -> StorageResult<Url> {
    let parsed =
        Url::parse(url).map_err(|e| StorageError::InvalidUrl(format!("'{}': {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(StorageError::InvalidUrl(format!(
            "'{}': unsupported scheme '{}'",
            url, scheme
        ))),
    }
}

#[async_trait]
impl UrlFetcher for HttpFetcher {
    async fn download(&self, url: &str, path: &Path) -> StorageResult<()> {
        let parsed = validate_fetch_url(url)?;
        debug!("Fetching {} to {}", url, path.display());

        let mut resp = self
            .http
            .get(parsed)
            .timeout(self.config.download_timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StorageError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(len) = resp.content_length() {
            if len > self.config.max_bytes {
                return Err(StorageError::download_failed(format!(
                    "{} is too large ({} bytes > {} bytes limit)",
                    url, len, self.config.max_bytes
                )));
            }
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(path).await?;

        let mut total: u64 = 0;
        while let Some(chunk) = resp.chunk().await? {
            total = total.saturating_add(chunk.len() as u64);
            if total > self.config.max_bytes {
                drop(file);
                let _ = tokio::fs::remove_file(path).await;
                return Err(StorageError::download_failed(format!(
                    "{} exceeded the {} byte limit",
                    url, self.config.max_bytes
                )));
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        info!(bytes = total, "Fetched {} to {}", url, path.display());
        Ok(())
    }

    async fn is_reachable(&self, url: &str) -> bool {
        let Ok(parsed) = validate_fetch_url(url) else {
            return false;
        };

        match self
            .http
            .head(parsed)
            .timeout(self.config.head_timeout)
            .send()
            .await
        {
            Ok(resp) => {
                let ok = resp.status().is_success();
                if !ok {
                    warn!(status = resp.status().as_u16(), "HEAD {} not OK", url);
                }
                ok
            }
            Err(e) => {
                warn!("HEAD {} failed: {}", url, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(FetchConfig::default()).unwrap()
    }

    #[test]
    fn test_validate_fetch_url() {
        assert!(validate_fetch_url("https://cdn.example.com/a.mp4").is_ok());
        assert!(matches!(
            validate_fetch_url("file:///etc/passwd"),
            Err(StorageError::InvalidUrl(_))
        ));
        assert!(validate_fetch_url("not a url").is_err());
    }

    #[tokio::test]
    async fn test_download_writes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/hero.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"video-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("hero.mp4");
        fetcher()
            .download(&format!("{}/hero.mp4", server.uri()), &out)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), b"video-bytes");
    }

    #[tokio::test]
    async fn test_download_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = fetcher()
            .download(&format!("{}/missing.mp4", server.uri()), &dir.path().join("x"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_download_size_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 64]))
            .mount(&server)
            .await;

        let limited = HttpFetcher::new(FetchConfig {
            max_bytes: 16,
            ..FetchConfig::default()
        })
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("big.bin");
        let err = limited
            .download(&format!("{}/big.bin", server.uri()), &out)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::DownloadFailed(_)));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_is_reachable() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(url_path("/ok.mp3"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(url_path("/gone.mp3"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let fetcher = fetcher();
        assert!(fetcher.is_reachable(&format!("{}/ok.mp3", server.uri())).await);
        assert!(!fetcher.is_reachable(&format!("{}/gone.mp3", server.uri())).await);
        assert!(!fetcher.is_reachable("ftp://example.com/a.mp3").await);
    }
}
