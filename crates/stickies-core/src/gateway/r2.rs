//! Cloudflare R2 blob store for note images.

use std::fmt;

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::{primitives::ByteStream, Client};
use aws_types::region::Region;

use super::BlobStore;
use crate::util::{is_http_url, sanitize};
use crate::{Error, Result};

const ENV_ACCOUNT_ID: &str = "R2_ACCOUNT_ID";
const ENV_BUCKET: &str = "R2_BUCKET";
const ENV_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
const ENV_PUBLIC_BASE_URL: &str = "R2_PUBLIC_BASE_URL";

/// Cloudflare R2 configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct R2Config {
    /// Cloudflare account identifier.
    pub account_id: String,
    /// R2 bucket name.
    pub bucket: String,
    /// Access key id for S3-compatible auth.
    pub access_key_id: String,
    /// Secret access key for S3-compatible auth.
    pub secret_access_key: String,
    /// Public URL base the bucket is served from.
    pub public_base_url: String,
}

impl fmt::Debug for R2Config {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("R2Config")
            .field("account_id", &self.account_id)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

impl R2Config {
    /// Parse R2 settings through `lookup`.
    ///
    /// Returns `Ok(None)` when no R2 variables are set and an error when only
    /// a partial configuration is provided. Images must be publicly readable,
    /// so `R2_PUBLIC_BASE_URL` is required alongside the credentials.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let account_id = read(ENV_ACCOUNT_ID);
        let bucket = read(ENV_BUCKET);
        let access_key_id = read(ENV_ACCESS_KEY_ID);
        let secret_access_key = read(ENV_SECRET_ACCESS_KEY);
        let public_base_url = read(ENV_PUBLIC_BASE_URL);

        let any_present = account_id.is_some()
            || bucket.is_some()
            || access_key_id.is_some()
            || secret_access_key.is_some()
            || public_base_url.is_some();
        if !any_present {
            return Ok(None);
        }

        let (
            Some(account_id),
            Some(bucket),
            Some(access_key_id),
            Some(secret_access_key),
            Some(public_base_url),
        ) = (
            account_id.clone(),
            bucket.clone(),
            access_key_id.clone(),
            secret_access_key.clone(),
            public_base_url.clone(),
        )
        else {
            let missing = [
                (ENV_ACCOUNT_ID, account_id.is_none()),
                (ENV_BUCKET, bucket.is_none()),
                (ENV_ACCESS_KEY_ID, access_key_id.is_none()),
                (ENV_SECRET_ACCESS_KEY, secret_access_key.is_none()),
                (ENV_PUBLIC_BASE_URL, public_base_url.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect::<Vec<_>>();
            return Err(Error::Config(format!(
                "R2 configuration is incomplete. Missing: {}",
                missing.join(", ")
            )));
        };

        if !is_http_url(&public_base_url) {
            return Err(Error::Config(format!(
                "{ENV_PUBLIC_BASE_URL} must start with http:// or https://"
            )));
        }

        Ok(Some(Self {
            account_id,
            bucket,
            access_key_id,
            secret_access_key,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }))
    }

    /// Cloudflare R2 S3-compatible endpoint URL.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }
}

/// R2-backed image storage.
#[derive(Clone)]
pub struct R2BlobStore {
    bucket: String,
    public_base_url: String,
    client: Client,
}

impl R2BlobStore {
    #[must_use]
    pub fn new(config: R2Config) -> Self {
        let client = build_s3_client(&config);
        Self {
            bucket: config.bucket,
            public_base_url: config.public_base_url,
            client,
        }
    }
}

#[async_trait]
impl BlobStore for R2BlobStore {
    async fn upload(&self, object_key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let object_key = normalize_object_key(object_key)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .content_type(content_type)
            .body(ByteStream::from(bytes.to_vec()))
            .send()
            .await
            .map_err(|error| {
                Error::Upload(format!(
                    "R2 put_object failed for {}/{object_key}: {}",
                    self.bucket,
                    sanitize(&error)
                ))
            })?;
        Ok(())
    }

    fn public_url(&self, object_key: &str) -> String {
        format!(
            "{}/{}",
            self.public_base_url,
            object_key.trim_matches('/')
        )
    }
}

fn build_s3_client(config: &R2Config) -> Client {
    let credentials = Credentials::new(
        config.access_key_id.clone(),
        config.secret_access_key.clone(),
        None,
        None,
        "stickies-r2-images",
    );

    let sdk_config = aws_sdk_s3::config::Builder::new()
        .region(Region::new("auto"))
        .credentials_provider(credentials)
        .endpoint_url(config.endpoint_url())
        .force_path_style(true)
        .build();

    Client::from_conf(sdk_config)
}

fn normalize_object_key(object_key: &str) -> Result<String> {
    let object_key = object_key.trim().trim_matches('/').to_string();
    if object_key.is_empty() {
        return Err(Error::Upload("Image object key cannot be empty".to_string()));
    }
    if object_key.contains("..") {
        return Err(Error::Upload(
            "Image object key must not contain path traversal segments".to_string(),
        ));
    }
    Ok(object_key)
}
