use std::fs;
use std::io::Write;
use std::path::Path;

use stickies_core::composer::Composer;
use stickies_core::media::ImageFile;
use stickies_core::notify::{Notice, Notifier};
use stickies_core::NoteColor;

use crate::commands::common::{normalize_content, read_piped_stdin, Session};
use crate::error::CliError;

pub async fn run_add(
    session: &Session,
    content_parts: &[String],
    color: &str,
    image: Option<&Path>,
    notifier: &dyn Notifier,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let color = color.parse::<NoteColor>().map_err(stickies_core::Error::from)?;
    let content = match normalize_content(&content_parts.join(" ")) {
        Some(content) => Some(content),
        None if image.is_none() => read_piped_stdin()?,
        None => None,
    };
    if content.is_none() && image.is_none() {
        return Err(CliError::EmptyContent);
    }

    let mut composer = Composer::new();
    composer.open();
    composer.edit_content(content.unwrap_or_default())?;
    composer.set_color(color)?;
    if let Some(path) = image {
        composer.attach_image(read_image(path)?)?;
    }

    let note = composer
        .commit(&session.repository(), &session.uploader())
        .await?;

    tracing::debug!(note_id = %note.id, color = %note.color.name(), "Created note");
    notifier.notify(Notice::note_created());
    writeln!(out, "{}", note.id)?;
    Ok(())
}

fn read_image(path: &Path) -> Result<ImageFile, CliError> {
    let bytes = fs::read(path).map_err(|source| CliError::ImageRead {
        path: path.display().to_string(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ImageFile::new(file_name, None, bytes))
}
