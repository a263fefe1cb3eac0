use std::io::Write;

use crate::commands::common::{format_note_lines, note_to_list_item, NoteListItem, Session};
use crate::error::CliError;

pub async fn run_list(
    session: &Session,
    limit: Option<usize>,
    as_json: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut notes = session.repository().list_notes().await?;
    if let Some(limit) = limit {
        notes.truncate(limit);
    }

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        writeln!(out, "{}", serde_json::to_string_pretty(&json_items)?)?;
    } else if notes.is_empty() {
        writeln!(out, "No notes yet.")?;
    } else {
        for line in format_note_lines(&notes) {
            writeln!(out, "{line}")?;
        }
    }

    Ok(())
}
