//! stickies-core - Core library for Stickies
//!
//! This crate contains the note models, the storage gateway clients, and the
//! workflows (composer, gallery, sharing) used by the web server and the CLI.

pub mod composer;
pub mod config;
pub mod error;
pub mod gallery;
pub mod gateway;
pub mod media;
pub mod models;
pub mod notify;
pub mod repository;
pub mod share;
pub mod util;

pub use error::{Error, Result, ValidationError};
pub use models::{NewNote, Note, NoteColor, NoteId};
