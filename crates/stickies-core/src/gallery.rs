//! Gallery state: the confirmed list of notes as last reported by the store.
//!
//! Nothing here is optimistic. The list only changes after the record store
//! has confirmed a load, insert, or delete.

use crate::models::{Note, NoteId};
use crate::repository::NoteRepository;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryStatus {
    /// The first load has not resolved yet.
    Loading,
    Ready,
    /// The first load failed; nothing has ever been shown.
    Failed,
}

#[derive(Debug, Clone)]
pub struct Gallery {
    status: GalleryStatus,
    notes: Vec<Note>,
}

impl Default for Gallery {
    fn default() -> Self {
        Self::new()
    }
}

impl Gallery {
    pub const fn new() -> Self {
        Self {
            status: GalleryStatus::Loading,
            notes: Vec::new(),
        }
    }

    pub const fn status(&self) -> GalleryStatus {
        self.status
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == *id)
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Apply the result of a `list_notes` call.
    ///
    /// A failure keeps whatever was shown before and is handed back to the
    /// caller for display.
    pub fn apply_load(&mut self, result: Result<Vec<Note>>) -> Result<()> {
        match result {
            Ok(notes) => {
                self.notes = notes;
                self.status = GalleryStatus::Ready;
                Ok(())
            }
            Err(error) => {
                if self.status == GalleryStatus::Loading {
                    self.status = GalleryStatus::Failed;
                }
                Err(error)
            }
        }
    }

    /// Reload from the store.
    pub async fn load(&mut self, repository: &NoteRepository) -> Result<()> {
        let result = repository.list_notes().await;
        self.apply_load(result)
    }

    /// Show a note the store has just confirmed, keeping newest-first order.
    pub fn note_created(&mut self, note: Note) {
        if self.get(&note.id).is_some() {
            return;
        }
        let position = self
            .notes
            .partition_point(|existing| existing.created_at > note.created_at);
        self.notes.insert(position, note);
    }

    /// Apply the result of a `delete_note` call for `id`.
    pub fn apply_delete(&mut self, id: &NoteId, result: Result<()>) -> Result<()> {
        result?;
        self.notes.retain(|note| note.id != *id);
        Ok(())
    }

    /// Delete through the store, then drop the card.
    pub async fn delete(&mut self, repository: &NoteRepository, id: &NoteId) -> Result<()> {
        let result = repository.delete_note(id).await;
        self.apply_delete(id, result)
    }
}
