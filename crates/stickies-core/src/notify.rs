//! User-facing notices and the clipboard side effect.
//!
//! Both are fire-and-forget: nothing reports back into the note workflows.

use serde::Serialize;

use crate::error::ValidationError;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient notification shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn note_created() -> Self {
        Self::success("Note created!", "Your note has been saved successfully.")
    }

    pub fn note_deleted() -> Self {
        Self::success("Note deleted", "Your note has been removed.")
    }

    pub fn link_copied() -> Self {
        Self::success("Link copied!", "Share URL has been copied to your clipboard.")
    }

    /// Map a failed operation onto the notice the user sees.
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Validation(ValidationError::ImageTooLarge { .. }) => Self::error(
                "File too large",
                "Please select an image smaller than 5MB",
            ),
            Error::Validation(ValidationError::NotAnImage(_) | ValidationError::EmptyImage) => {
                Self::error("Unsupported file", "Please select an image file")
            }
            Error::Validation(other) => Self::error("Invalid note", other.to_string()),
            Error::Repository(_) => Self::error(
                "Something went wrong",
                "We couldn't reach your notes. Please try again.",
            ),
            Error::Upload(_) => Self::error(
                "Upload failed",
                "We couldn't upload your image. Your note was not saved.",
            ),
            Error::NotFound(_) => Self::error("Note not found", "This note doesn't exist."),
            Error::Config(message) => Self::error("Configuration error", message.clone()),
        }
    }
}

/// Receives notices for display.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Platform clipboard.
pub trait Clipboard: Send + Sync {
    fn copy_text(&self, text: &str);
}
