//! Storage Gateway contract and its backends.
//!
//! The gateway is the hosted service that owns every durable byte: a record
//! store for note rows and a blob store for uploaded images. This crate only
//! consumes it. [`NoteStore`] and [`BlobStore`] describe the operations the
//! rest of the crate relies on; the backends translate them onto Supabase,
//! Cloudflare R2, or process memory.

mod memory;
mod r2;
mod supabase;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::GatewayConfig;
use crate::media::ImageUploader;
use crate::models::{NewNote, Note, NoteId};
use crate::repository::NoteRepository;
use crate::Result;

pub use memory::{InMemoryGateway, StoredBlob};
pub use r2::{R2BlobStore, R2Config};
pub use supabase::{SupabaseConfig, SupabaseGateway};

/// Record store operations for note rows.
///
/// Failures surface as [`crate::Error::Repository`].
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// All rows, newest `created_at` first.
    async fn select_newest_first(&self) -> Result<Vec<Note>>;

    /// Insert a row and return it with the store-assigned `id` and `created_at`.
    async fn insert(&self, note: &NewNote) -> Result<Note>;

    /// Delete a row by id. Returns whether a row was actually removed.
    async fn delete(&self, id: &NoteId) -> Result<bool>;

    /// Fetch one row; `Ok(None)` when the store confirms it does not exist.
    async fn select_by_id(&self, id: &NoteId) -> Result<Option<Note>>;
}

/// Blob store operations for note images.
///
/// Failures surface as [`crate::Error::Upload`].
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `object_key`.
    async fn upload(&self, object_key: &str, bytes: &[u8], content_type: &str) -> Result<()>;

    /// Publicly resolvable URL for an uploaded object.
    fn public_url(&self, object_key: &str) -> String;
}

/// Connected gateway: one record store and one blob store.
#[derive(Clone)]
pub struct Gateway {
    notes: Arc<dyn NoteStore>,
    blobs: Arc<dyn BlobStore>,
    local: Option<InMemoryGateway>,
}

impl Gateway {
    /// Build the backends described by `config`.
    ///
    /// Without a Supabase configuration the gateway runs in local mode,
    /// keeping records and blobs in memory; `local_blob_base_url` is then the
    /// public prefix under which the caller serves those blobs.
    pub fn connect(config: &GatewayConfig, local_blob_base_url: &str) -> Result<Self> {
        let Some(supabase) = config.supabase.clone() else {
            tracing::warn!("No SUPABASE_URL configured; notes are kept in memory only");
            return Ok(Self::in_memory(InMemoryGateway::new(local_blob_base_url)));
        };

        let supabase = Arc::new(SupabaseGateway::new(supabase, config.http_timeout)?);
        let blobs: Arc<dyn BlobStore> = match config.r2.clone() {
            Some(r2) => {
                tracing::info!(bucket = %r2.bucket, "Storing note images in R2");
                Arc::new(R2BlobStore::new(r2))
            }
            None => supabase.clone(),
        };

        Ok(Self {
            notes: supabase,
            blobs,
            local: None,
        })
    }

    /// Gateway backed entirely by `memory`.
    #[must_use]
    pub fn in_memory(memory: InMemoryGateway) -> Self {
        Self {
            notes: Arc::new(memory.clone()),
            blobs: Arc::new(memory.clone()),
            local: Some(memory),
        }
    }

    /// The in-memory backend when running in local mode.
    #[must_use]
    pub const fn local(&self) -> Option<&InMemoryGateway> {
        self.local.as_ref()
    }

    #[must_use]
    pub fn repository(&self) -> NoteRepository {
        NoteRepository::new(self.notes.clone())
    }

    #[must_use]
    pub fn uploader(&self) -> ImageUploader {
        ImageUploader::new(self.blobs.clone())
    }
}
