//! Data models for Stickies

mod color;
mod note;

pub use color::NoteColor;
pub use note::{NewNote, Note, NoteId};
