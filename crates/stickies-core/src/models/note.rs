//! Note model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::NoteColor;
use crate::error::ValidationError;
use crate::util::{non_blank_text, normalize_text_option};

/// Gateway-assigned note identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(Uuid);

impl NoteId {
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// A persisted sticky note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// Text body; absent for image-only notes
    #[serde(default)]
    pub content: Option<String>,
    /// Public URL of the uploaded image
    #[serde(default)]
    pub image_url: Option<String>,
    pub color: NoteColor,
    /// Assigned by the record store; the gallery sort key
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// Text body, or the empty string for image-only notes.
    #[must_use]
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Get first line as a preview, truncated to `max_len` characters
    #[must_use]
    pub fn title_preview(&self, max_len: usize) -> String {
        self.text()
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}

/// Insert payload for the record store.
///
/// Construction enforces that a note carries text or an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewNote {
    content: Option<String>,
    image_url: Option<String>,
    color: NoteColor,
}

impl NewNote {
    /// Whitespace-only content counts as absent; other content is kept as typed.
    pub fn new(
        content: Option<String>,
        image_url: Option<String>,
        color: NoteColor,
    ) -> Result<Self, ValidationError> {
        let content = non_blank_text(content);
        let image_url = normalize_text_option(image_url);
        if content.is_none() && image_url.is_none() {
            return Err(ValidationError::EmptyNote);
        }
        Ok(Self {
            content,
            image_url,
            color,
        })
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub const fn color(&self) -> NoteColor {
        self.color
    }

    /// Materialize the stored note once the gateway has assigned identity.
    #[must_use]
    pub fn into_note(self, id: NoteId, created_at: DateTime<Utc>) -> Note {
        Note {
            id,
            content: self.content,
            image_url: self.image_url,
            color: self.color,
            created_at,
        }
    }
}
