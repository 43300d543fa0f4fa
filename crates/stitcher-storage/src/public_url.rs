//! Public URL derivation for stored objects.
//!
//! Objects are served either from a configured public base URL (a custom
//! domain bound to the bucket) or, when none is configured, from the
//! account's default `r2.dev` development URL.

use stitcher_models::StoreCredentials;
use url::Url;

use crate::error::{StorageError, StorageResult};

/// Builds public URLs for object keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrlBuilder {
    base: Option<String>,
    account_id: String,
    bucket: String,
}

impl PublicUrlBuilder {
    /// Create a builder. The base URL is normalized once here.
    pub fn new(
        base: Option<&str>,
        account_id: impl Into<String>,
        bucket: impl Into<String>,
    ) -> StorageResult<Self> {
        let base = match base.map(str::trim).filter(|b| !b.is_empty()) {
            Some(raw) => Some(normalize_base_url(raw)?),
            None => None,
        };

        Ok(Self {
            base,
            account_id: account_id.into(),
            bucket: bucket.into(),
        })
    }

    pub fn from_credentials(credentials: &StoreCredentials) -> StorageResult<Self> {
        Self::new(
            credentials.public_url.as_deref(),
            &credentials.account_id,
            &credentials.bucket_name,
        )
    }

    /// Public URL for `key`.
    pub fn url_for(&self, key: &str) -> String {
        let key = key.trim_start_matches('/');
        match &self.base {
            Some(base) => format!("{}/{}", base, key),
            None => format!(
                "https://pub-{}.r2.dev/{}/{}",
                self.account_id, self.bucket, key
            ),
        }
    }

    /// Normalized base URL, if one is configured.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }
}

/// Give a base URL an explicit scheme (`https://` when missing) and drop
/// trailing slashes.
pub fn normalize_base_url(raw: &str) -> StorageResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&with_scheme)
        .map_err(|e| StorageError::InvalidUrl(format!("{}: {}", raw, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(StorageError::InvalidUrl(format!(
            "{}: public base URL must be an http(s) URL with a host",
            raw
        )));
    }

    Ok(with_scheme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_without_scheme_gets_https() {
        let builder = PublicUrlBuilder::new(Some("blob.example.app/"), "acc", "bucket").unwrap();
        assert_eq!(
            builder.url_for("/audio/chunks/1-chunk-1.mp3"),
            "https://blob.example.app/audio/chunks/1-chunk-1.mp3"
        );
    }

    #[test]
    fn test_explicit_scheme_is_kept() {
        let builder =
            PublicUrlBuilder::new(Some("http://localhost:9000/media"), "acc", "bucket").unwrap();
        assert_eq!(builder.url_for("out.mp4"), "http://localhost:9000/media/out.mp4");
    }

    #[test]
    fn test_default_provider_pattern() {
        let builder = PublicUrlBuilder::new(None, "abc123", "videos").unwrap();
        assert_eq!(
            builder.url_for("final/out.mp4"),
            "https://pub-abc123.r2.dev/videos/final/out.mp4"
        );

        let blank = PublicUrlBuilder::new(Some("   "), "abc123", "videos").unwrap();
        assert!(blank.base().is_none());
    }

    #[test]
    fn test_invalid_base_rejected() {
        assert!(normalize_base_url("ftp://files.example.com").is_err());
        assert!(normalize_base_url("https://").is_err());
    }
}
