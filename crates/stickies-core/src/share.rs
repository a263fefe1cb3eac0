//! Share links and the single-note view they resolve to.

use crate::models::{Note, NoteId};
use crate::notify::{Clipboard, Notice, Notifier};
use crate::repository::NoteRepository;
use crate::Error;

/// Path segment shared notes live under.
pub const SHARE_PATH: &str = "/note";

/// `{origin}/note/{id}`.
pub fn share_url(origin: &str, id: &NoteId) -> String {
    format!("{}{SHARE_PATH}/{id}", origin.trim_end_matches('/'))
}

/// What the single-note page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareView {
    Loading,
    Found(Note),
    NotFound,
}

/// Resolves share links against the record store.
#[derive(Clone)]
pub struct ShareResolver {
    notes: NoteRepository,
    origin: String,
}

impl ShareResolver {
    pub fn new(notes: NoteRepository, origin: impl Into<String>) -> Self {
        Self {
            notes,
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn share_url(&self, id: &NoteId) -> String {
        share_url(&self.origin, id)
    }

    /// Look up the note behind a raw id taken from the URL path.
    ///
    /// Never fails: a missing note and an unreachable store both render as
    /// not found, but they are logged at different levels.
    pub async fn resolve(&self, raw_id: &str) -> ShareView {
        let Ok(id) = raw_id.parse::<NoteId>() else {
            tracing::debug!(raw_id, "Share link carries a malformed note id");
            return ShareView::NotFound;
        };
        match self.notes.get_note(&id).await {
            Ok(note) => ShareView::Found(note),
            Err(Error::NotFound(_)) => {
                tracing::debug!(note_id = %id, "Shared note does not exist");
                ShareView::NotFound
            }
            Err(error) => {
                tracing::warn!(note_id = %id, %error, "Failed to load shared note");
                ShareView::NotFound
            }
        }
    }

    /// Put the note's share link on the clipboard and announce it.
    pub fn copy_share_link(
        &self,
        id: &NoteId,
        clipboard: &dyn Clipboard,
        notifier: &dyn Notifier,
    ) -> String {
        let url = self.share_url(id);
        clipboard.copy_text(&url);
        notifier.notify(Notice::link_copied());
        url
    }
}
