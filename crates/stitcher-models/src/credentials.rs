//! Object store credentials carried by every job.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};

/// Marker values that callers use for smoke tests; never valid credentials.
const RESERVED_EXACT: &[&str] = &["test"];
const RESERVED_SUBSTRINGS: &[&str] = &["placeholder"];

/// R2 (S3 API) credentials and bucket coordinates for one job.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCredentials {
    /// Cloudflare account identifier
    pub account_id: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Public base URL for objects (custom domain), if configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    /// S3 API endpoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl StoreCredentials {
    /// Build credentials from the optional wire fields, rejecting missing or reserved values.
    pub fn from_parts(
        account_id: Option<String>,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        bucket_name: Option<String>,
        public_url: Option<String>,
        endpoint: Option<String>,
    ) -> ValidationResult<Self> {
        let credentials = Self {
            account_id: required("r2_account_id", account_id)?,
            access_key_id: required("r2_access_key_id", access_key_id)?,
            secret_access_key: required("r2_secret_access_key", secret_access_key)?,
            bucket_name: required("r2_bucket_name", bucket_name)?,
            public_url: non_empty(public_url),
            endpoint: non_empty(endpoint),
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// Reject reserved test markers in any credential field.
    pub fn validate(&self) -> ValidationResult<()> {
        let fields = [
            ("r2_account_id", &self.account_id),
            ("r2_access_key_id", &self.access_key_id),
            ("r2_secret_access_key", &self.secret_access_key),
            ("r2_bucket_name", &self.bucket_name),
        ];

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(name));
            }
            if is_reserved(value) {
                return Err(ValidationError::ReservedCredential(name));
            }
        }

        Ok(())
    }

    /// S3 API endpoint for this account.
    pub fn endpoint_url(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}.r2.cloudflarestorage.com", self.account_id))
    }
}

impl fmt::Debug for StoreCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .field("public_url", &self.public_url)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

fn is_reserved(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    RESERVED_EXACT.iter().any(|m| lowered == *m)
        || RESERVED_SUBSTRINGS.iter().any(|m| lowered.contains(m))
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub(crate) fn required(field: &'static str, value: Option<String>) -> ValidationResult<String> {
    non_empty(value).ok_or(ValidationError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(secret: &str) -> ValidationResult<StoreCredentials> {
        StoreCredentials::from_parts(
            Some("acc123".into()),
            Some("AKIA".into()),
            Some(secret.into()),
            Some("media".into()),
            Some(String::new()),
            None,
        )
    }

    #[test]
    fn test_valid_credentials() {
        let creds = parts("s3cr3t").unwrap();
        assert_eq!(creds.bucket_name, "media");
        assert!(creds.public_url.is_none(), "empty public url is treated as unset");
        assert_eq!(
            creds.endpoint_url(),
            "https://acc123.r2.cloudflarestorage.com"
        );
    }

    #[test]
    fn test_missing_field() {
        let err = StoreCredentials::from_parts(
            Some("acc".into()),
            None,
            Some("secret".into()),
            Some("bucket".into()),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("r2_access_key_id"));
    }

    #[test]
    fn test_reserved_markers_rejected() {
        assert_eq!(
            parts("TEST").unwrap_err(),
            ValidationError::ReservedCredential("r2_secret_access_key")
        );
        assert_eq!(
            parts("my-placeholder-key").unwrap_err(),
            ValidationError::ReservedCredential("r2_secret_access_key")
        );
        // "test" inside a longer value is a legitimate credential
        assert!(parts("contest-key").is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = parts("super-secret-value").unwrap();
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
