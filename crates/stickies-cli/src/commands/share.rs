use stickies_core::notify::{Clipboard, Notifier};
use stickies_core::share::ShareView;

use crate::commands::common::{parse_note_id, Session};
use crate::error::CliError;

/// Resolve the note first so a typo does not hand out a dead link.
pub async fn run_share(
    session: &Session,
    id: &str,
    clipboard: &dyn Clipboard,
    notifier: &dyn Notifier,
) -> Result<String, CliError> {
    let note_id = parse_note_id(id)?;
    let resolver = session.share_resolver();

    match resolver.resolve(&note_id.to_string()).await {
        ShareView::Found(note) => Ok(resolver.copy_share_link(&note.id, clipboard, notifier)),
        ShareView::NotFound | ShareView::Loading => {
            Err(CliError::NoteNotFound(note_id.to_string()))
        }
    }
}
