//! In-process gateway used for local mode and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{BlobStore, NoteStore};
use crate::models::{NewNote, Note, NoteId};
use crate::{Error, Result};

/// A stored blob and its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Default)]
struct Tables {
    notes: Vec<Note>,
    blobs: HashMap<String, StoredBlob>,
    last_created_at: Option<DateTime<Utc>>,
}

struct Inner {
    tables: Mutex<Tables>,
    records_offline: AtomicBool,
    blobs_offline: AtomicBool,
    public_base_url: String,
}

/// Record and blob store held in memory.
///
/// Clones share the same tables. Either half can be switched offline to
/// simulate an unreachable service.
#[derive(Clone)]
pub struct InMemoryGateway {
    inner: Arc<Inner>,
}

impl InMemoryGateway {
    /// `public_base_url` prefixes every blob's public URL.
    #[must_use]
    pub fn new(public_base_url: &str) -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: Mutex::new(Tables::default()),
                records_offline: AtomicBool::new(false),
                blobs_offline: AtomicBool::new(false),
                public_base_url: public_base_url.trim_end_matches('/').to_string(),
            }),
        }
    }

    pub fn set_records_offline(&self, offline: bool) {
        self.inner.records_offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_blobs_offline(&self, offline: bool) {
        self.inner.blobs_offline.store(offline, Ordering::SeqCst);
    }

    pub async fn note_count(&self) -> usize {
        self.inner.tables.lock().await.notes.len()
    }

    pub async fn blob_count(&self) -> usize {
        self.inner.tables.lock().await.blobs.len()
    }

    pub async fn blob(&self, object_key: &str) -> Option<StoredBlob> {
        self.inner.tables.lock().await.blobs.get(object_key).cloned()
    }

    fn check_records(&self) -> Result<()> {
        if self.inner.records_offline.load(Ordering::SeqCst) {
            return Err(Error::Repository(
                "record store is unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl NoteStore for InMemoryGateway {
    async fn select_newest_first(&self) -> Result<Vec<Note>> {
        self.check_records()?;
        let tables = self.inner.tables.lock().await;
        let mut notes = tables.notes.clone();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    async fn insert(&self, note: &NewNote) -> Result<Note> {
        self.check_records()?;
        let mut tables = self.inner.tables.lock().await;

        // Keep creation times strictly increasing so ordering is total.
        let mut created_at = Utc::now();
        if let Some(last) = tables.last_created_at {
            if created_at <= last {
                created_at = last + Duration::microseconds(1);
            }
        }
        tables.last_created_at = Some(created_at);

        let stored = note
            .clone()
            .into_note(NoteId::from_uuid(Uuid::now_v7()), created_at);
        tables.notes.push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: &NoteId) -> Result<bool> {
        self.check_records()?;
        let mut tables = self.inner.tables.lock().await;
        let before = tables.notes.len();
        tables.notes.retain(|note| note.id != *id);
        Ok(tables.notes.len() != before)
    }

    async fn select_by_id(&self, id: &NoteId) -> Result<Option<Note>> {
        self.check_records()?;
        let tables = self.inner.tables.lock().await;
        Ok(tables.notes.iter().find(|note| note.id == *id).cloned())
    }
}

#[async_trait]
impl BlobStore for InMemoryGateway {
    async fn upload(&self, object_key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        if self.inner.blobs_offline.load(Ordering::SeqCst) {
            return Err(Error::Upload("blob store is unreachable".to_string()));
        }
        let mut tables = self.inner.tables.lock().await;
        tables.blobs.insert(
            object_key.to_string(),
            StoredBlob {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, object_key: &str) -> String {
        format!(
            "{}/{}",
            self.inner.public_base_url,
            object_key.trim_matches('/')
        )
    }
}
