//! Note repository: the four record operations the app needs.

use std::sync::Arc;

use crate::gateway::NoteStore;
use crate::models::{NewNote, Note, NoteColor, NoteId};
use crate::{Error, Result};

/// Note CRUD over the gateway's record store.
#[derive(Clone)]
pub struct NoteRepository {
    store: Arc<dyn NoteStore>,
}

impl NoteRepository {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }

    /// All notes, newest first.
    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let mut notes = self.store.select_newest_first().await.map_err(|error| {
            tracing::warn!(%error, "Failed to list notes");
            error
        })?;
        // Stable: rows with equal timestamps keep the store's order.
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tracing::debug!(count = notes.len(), "Listed notes");
        Ok(notes)
    }

    /// Insert a note. Rejected locally, before any request, when it has
    /// neither text nor an image.
    pub async fn insert_note(
        &self,
        content: Option<String>,
        image_url: Option<String>,
        color: NoteColor,
    ) -> Result<Note> {
        let new_note = NewNote::new(content, image_url, color)?;
        let note = self.store.insert(&new_note).await.map_err(|error| {
            tracing::warn!(%error, "Failed to insert note");
            error
        })?;
        tracing::info!(
            note_id = %note.id,
            color = %note.color,
            has_image = note.image_url.is_some(),
            "Created note"
        );
        Ok(note)
    }

    /// Delete a note. Deleting an id that no longer exists succeeds.
    pub async fn delete_note(&self, id: &NoteId) -> Result<()> {
        let removed = self.store.delete(id).await.map_err(|error| {
            tracing::warn!(note_id = %id, %error, "Failed to delete note");
            error
        })?;
        if removed {
            tracing::info!(note_id = %id, "Deleted note");
        } else {
            tracing::debug!(note_id = %id, "Delete matched no note");
        }
        Ok(())
    }

    /// Fetch one note; [`Error::NotFound`] when the store confirms absence.
    pub async fn get_note(&self, id: &NoteId) -> Result<Note> {
        self.store
            .select_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }
}
