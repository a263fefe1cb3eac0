//! Error types for stickies-core

use thiserror::Error;

/// Result type alias using stickies-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stickies-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected before any network call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Record store failure (transport, status, or decoding)
    #[error("Repository error: {0}")]
    Repository(String),

    /// Blob store failure
    #[error("Upload error: {0}")]
    Upload(String),

    /// The record store confirmed the note does not exist
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Client-side validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("A note needs some text or an image")]
    EmptyNote,

    #[error("Image is {size} bytes; the limit is {limit} bytes")]
    ImageTooLarge { size: u64, limit: u64 },

    #[error("File is not an image: {0}")]
    NotAnImage(String),

    #[error("Image file is empty")]
    EmptyImage,

    #[error("Unknown color: {0}")]
    InvalidColor(String),
}
