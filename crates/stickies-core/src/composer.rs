//! Note composer: the draft state machine.
//!
//! ```text
//! Idle --open--> Drafting --commit--> Committing --ok--> Idle
//!                 ^   |                   |
//!                 |   +--cancel--> Idle   +--err--> Drafting (draft kept)
//!                 +-- edit (content, color, image)
//! ```
//!
//! Committing is split into [`Composer::begin_commit`] and
//! [`Composer::finish_commit`] so an owner behind a lock can release it while
//! the upload and insert run; a second submit in the meantime is refused.

use thiserror::Error;

use crate::media::{self, ImageFile, ImagePreview, ImageUploader};
use crate::models::{Note, NoteColor};
use crate::repository::NoteRepository;
use crate::Error;

/// An image chosen for the draft: original bytes plus the local preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedImage {
    pub file: ImageFile,
    pub preview: ImagePreview,
}

/// The unsaved note being composed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub content: String,
    pub image: Option<StagedImage>,
    pub color: NoteColor,
}

impl Draft {
    /// A draft can be saved when it has non-blank text or a staged image.
    pub fn is_committable(&self) -> bool {
        !self.content.trim().is_empty() || self.image.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerPhase {
    Idle,
    Drafting,
    Committing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum State {
    #[default]
    Idle,
    Drafting(Draft),
    Committing(Draft),
}

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error("No note is being composed")]
    NotDrafting,
    #[error("This note is already being saved")]
    CommitInProgress,
    #[error(transparent)]
    Note(#[from] Error),
}

impl ComposerError {
    /// The underlying note error, if the failure came from validation or the
    /// gateway rather than from the state machine.
    pub fn note_error(&self) -> Option<&Error> {
        match self {
            Self::Note(error) => Some(error),
            Self::NotDrafting | Self::CommitInProgress => None,
        }
    }
}

/// Owner of the single in-progress draft.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    state: State,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ComposerPhase {
        match self.state {
            State::Idle => ComposerPhase::Idle,
            State::Drafting(_) => ComposerPhase::Drafting,
            State::Committing(_) => ComposerPhase::Committing,
        }
    }

    /// The current draft, including while it is being saved.
    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            State::Idle => None,
            State::Drafting(draft) | State::Committing(draft) => Some(draft),
        }
    }

    /// Start a fresh draft. Opening an already open composer keeps its draft.
    pub fn open(&mut self) {
        if matches!(self.state, State::Idle) {
            self.state = State::Drafting(Draft::default());
        }
    }

    pub fn edit_content(&mut self, content: impl Into<String>) -> Result<(), ComposerError> {
        self.drafting_mut()?.content = content.into();
        Ok(())
    }

    pub fn set_color(&mut self, color: NoteColor) -> Result<(), ComposerError> {
        self.drafting_mut()?.color = color;
        Ok(())
    }

    /// Validate and preview `file`, then stage it. A rejected file leaves the
    /// draft untouched.
    pub fn attach_image(&mut self, file: ImageFile) -> Result<(), ComposerError> {
        let draft = self.drafting_mut()?;
        media::validate(&file).map_err(Error::from)?;
        let preview = media::preview(&file);
        draft.image = Some(StagedImage { file, preview });
        Ok(())
    }

    pub fn clear_image(&mut self) -> Result<(), ComposerError> {
        self.drafting_mut()?.image = None;
        Ok(())
    }

    /// Discard the draft.
    pub fn cancel(&mut self) -> Result<(), ComposerError> {
        match self.state {
            State::Committing(_) => Err(ComposerError::CommitInProgress),
            State::Idle | State::Drafting(_) => {
                self.state = State::Idle;
                Ok(())
            }
        }
    }

    /// Whether the save control should be enabled.
    pub fn can_commit(&self) -> bool {
        matches!(&self.state, State::Drafting(draft) if draft.is_committable())
    }

    /// Enter `Committing` and hand back a copy of the draft to save.
    pub fn begin_commit(&mut self) -> Result<Draft, ComposerError> {
        let draft = match &self.state {
            State::Idle => return Err(ComposerError::NotDrafting),
            State::Committing(_) => return Err(ComposerError::CommitInProgress),
            State::Drafting(draft) => draft.clone(),
        };
        if !draft.is_committable() {
            return Err(Error::from(crate::error::ValidationError::EmptyNote).into());
        }
        self.state = State::Committing(draft.clone());
        Ok(draft)
    }

    /// Leave `Committing`: back to `Idle` on success, back to `Drafting` with
    /// the same draft on failure.
    pub fn finish_commit(&mut self, outcome: crate::Result<Note>) -> Result<Note, ComposerError> {
        if !matches!(self.state, State::Committing(_)) {
            return Err(ComposerError::NotDrafting);
        }
        let State::Committing(draft) = std::mem::take(&mut self.state) else {
            return Err(ComposerError::NotDrafting);
        };
        match outcome {
            Ok(note) => Ok(note),
            Err(error) => {
                self.state = State::Drafting(draft);
                Err(error.into())
            }
        }
    }

    /// Save the draft in one step. Suited to owners that hold the composer
    /// exclusively for the whole commit.
    pub async fn commit(
        &mut self,
        notes: &NoteRepository,
        uploader: &ImageUploader,
    ) -> Result<Note, ComposerError> {
        let draft = self.begin_commit()?;
        let outcome = save_draft(&draft, notes, uploader).await;
        self.finish_commit(outcome)
    }

    fn drafting_mut(&mut self) -> Result<&mut Draft, ComposerError> {
        match &mut self.state {
            State::Drafting(draft) => Ok(draft),
            State::Committing(_) => Err(ComposerError::CommitInProgress),
            State::Idle => Err(ComposerError::NotDrafting),
        }
    }
}

/// Upload the staged image, if any, then insert the note.
///
/// When the insert fails after a successful upload the blob stays in the
/// store unreferenced.
pub async fn save_draft(
    draft: &Draft,
    notes: &NoteRepository,
    uploader: &ImageUploader,
) -> crate::Result<Note> {
    let image_url = match &draft.image {
        Some(staged) => Some(uploader.upload(&staged.file).await?),
        None => None,
    };
    let had_image = image_url.is_some();
    notes
        .insert_note(Some(draft.content.clone()), image_url, draft.color)
        .await
        .map_err(|error| {
            if had_image {
                tracing::warn!(%error, "Note insert failed after image upload; image left orphaned");
            }
            error
        })
}
