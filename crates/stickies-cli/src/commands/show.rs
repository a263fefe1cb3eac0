use std::io::Write;

use stickies_core::Error;

use crate::commands::common::{note_to_list_item, parse_note_id, Session};
use crate::error::CliError;

pub async fn run_show(
    session: &Session,
    id: &str,
    as_json: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let note_id = parse_note_id(id)?;
    let note = match session.repository().get_note(&note_id).await {
        Ok(note) => note,
        Err(Error::NotFound(_)) => return Err(CliError::NoteNotFound(note_id.to_string())),
        Err(error) => return Err(error.into()),
    };

    if as_json {
        writeln!(
            out,
            "{}",
            serde_json::to_string_pretty(&note_to_list_item(&note))?
        )?;
        return Ok(());
    }

    writeln!(out, "id:      {}", note.id)?;
    writeln!(out, "color:   {} ({})", note.color.name(), note.color.hex())?;
    writeln!(out, "created: {}", note.created_at.to_rfc3339())?;
    if let Some(url) = &note.image_url {
        writeln!(out, "image:   {url}")?;
    }
    writeln!(out, "share:   {}", session.share_resolver().share_url(&note.id))?;
    if let Some(content) = &note.content {
        writeln!(out)?;
        writeln!(out, "{content}")?;
    }
    Ok(())
}
