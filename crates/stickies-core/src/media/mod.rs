//! Image upload workflow: validate, preview locally, upload on save.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use chrono::Utc;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::gateway::BlobStore;
use crate::util::sanitize_token;
use crate::Result;

/// Largest accepted image, inclusive: 5 MiB.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// An image file selected by the user, held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl ImageFile {
    /// `declared_type` is the client-supplied MIME type, if any. When it is
    /// missing or generic the type is guessed from the file name.
    pub fn new(
        file_name: impl Into<String>,
        declared_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Self {
        let file_name = file_name.into();
        let content_type = resolve_content_type(declared_type, &file_name);
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        u64::try_from(self.bytes.len()).unwrap_or(u64::MAX)
    }
}

/// Local, displayable rendition of a staged image. Never uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePreview {
    pub file_name: String,
    pub mime_type: String,
    /// `data:` URI usable directly as an `<img src>`.
    pub data_uri: String,
}

/// Reject a file before any network activity.
pub fn validate(file: &ImageFile) -> std::result::Result<(), ValidationError> {
    if file.bytes.is_empty() {
        return Err(ValidationError::EmptyImage);
    }
    if file.size() > MAX_IMAGE_BYTES {
        return Err(ValidationError::ImageTooLarge {
            size: file.size(),
            limit: MAX_IMAGE_BYTES,
        });
    }
    if !file.content_type.starts_with("image/") {
        return Err(ValidationError::NotAnImage(file.content_type.clone()));
    }
    Ok(())
}

/// Build the local preview for a file.
pub fn preview(file: &ImageFile) -> ImagePreview {
    let encoded = BASE64_STANDARD.encode(&file.bytes);
    ImagePreview {
        file_name: file.file_name.clone(),
        mime_type: file.content_type.clone(),
        data_uri: format!("data:{};base64,{encoded}", file.content_type),
    }
}

/// Uploads image bytes to the gateway's blob store.
#[derive(Clone)]
pub struct ImageUploader {
    blobs: Arc<dyn BlobStore>,
}

impl ImageUploader {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Upload the original bytes under a fresh key and return the public URL.
    ///
    /// Every call creates a new object.
    pub async fn upload(&self, file: &ImageFile) -> Result<String> {
        let object_key = build_object_key(file.file_name(), Utc::now().timestamp_millis());
        self.blobs
            .upload(&object_key, file.bytes(), file.content_type())
            .await
            .map_err(|error| {
                tracing::warn!(%error, object_key = %object_key, "Image upload failed");
                error
            })?;
        let url = self.blobs.public_url(&object_key);
        tracing::info!(object_key = %object_key, size = file.size(), "Uploaded note image");
        Ok(url)
    }
}

/// `{unix_millis}-{random}.{ext}`, keeping the original extension.
pub fn build_object_key(file_name: &str, now_ms: i64) -> String {
    let random = Uuid::new_v4().simple().to_string();
    let random = &random[..12];
    let ext = file_name
        .trim()
        .rsplit_once('.')
        .map(|(_, ext)| sanitize_token(ext))
        .unwrap_or_default();
    if ext.is_empty() {
        format!("{now_ms}-{random}")
    } else {
        format!("{now_ms}-{random}.{ext}")
    }
}

fn resolve_content_type(declared: Option<&str>, file_name: &str) -> String {
    declared
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != "application/octet-stream")
        .map_or_else(
            || {
                mime_guess::from_path(file_name)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            },
            str::to_ascii_lowercase,
        )
}
