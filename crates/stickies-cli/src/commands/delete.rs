use std::io::Write;

use stickies_core::notify::{Notice, Notifier};

use crate::commands::common::{parse_note_id, Session};
use crate::error::CliError;

pub async fn run_delete(
    session: &Session,
    id: &str,
    notifier: &dyn Notifier,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let note_id = parse_note_id(id)?;
    session.repository().delete_note(&note_id).await?;

    notifier.notify(Notice::note_deleted());
    writeln!(out, "{note_id}")?;
    Ok(())
}
