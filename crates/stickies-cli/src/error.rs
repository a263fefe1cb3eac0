use std::io;

use stickies_core::composer::ComposerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] stickies_core::Error),
    #[error(transparent)]
    Composer(#[from] ComposerError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content or image provided")]
    EmptyContent,
    #[error("Note ID cannot be empty")]
    EmptyNoteId,
    #[error("Not a valid note id: {0}")]
    InvalidNoteId(String),
    #[error("Note not found: {0}")]
    NoteNotFound(String),
    #[error("Could not read image {path}: {source}")]
    ImageRead { path: String, source: io::Error },
    #[error("Configuration error: {0}")]
    Config(String),
}
