//! Server-side HTML for the gallery, the composer, and shared notes.

use std::fmt::Write as _;

use stickies_core::composer::{Composer, ComposerPhase, Draft};
use stickies_core::gallery::{Gallery, GalleryStatus};
use stickies_core::notify::{Notice, NoticeLevel};
use stickies_core::{Note, NoteColor};

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;background:#fafaf9;margin:0;padding:2rem;color:#1c1917}\
h1{margin-top:0}\
.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(220px,1fr));gap:1rem}\
.card{border-radius:.5rem;padding:1rem;box-shadow:0 1px 3px rgba(0,0,0,.15);overflow-wrap:anywhere}\
.card img{max-width:100%;border-radius:.25rem}\
.card .meta{font-size:.75rem;color:#57534e;margin-top:.5rem}\
.card form{display:inline}\
.notice{padding:.75rem 1rem;border-radius:.5rem;margin-bottom:.5rem}\
.notice.success{background:#dcfce7}.notice.error{background:#fee2e2}\
.composer{background:#fff;padding:1rem;border-radius:.5rem;margin-bottom:2rem;max-width:32rem}\
.composer textarea{width:100%;min-height:6rem}\
.swatch{display:inline-block;width:1.5rem;height:1.5rem;border-radius:50%;border:1px solid #d6d3d1;vertical-align:middle}\
.preview{max-width:12rem;display:block;margin:.5rem 0}";

/// Escape text for use in element content and quoted attributes.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\
         <title>{}</title><style>{STYLE}</style></head><body>{body}</body></html>",
        escape_html(title)
    )
}

/// Everything the home page shows for one request.
pub struct HomePage<'a> {
    pub gallery: &'a Gallery,
    pub composer: &'a Composer,
    pub notices: &'a [Notice],
    pub copied_link: Option<&'a str>,
}

pub fn home_page(page: &HomePage<'_>) -> String {
    let mut body = String::from("<h1>Sticky Notes</h1>");
    body.push_str(&notices(page.notices));
    if let Some(link) = page.copied_link {
        body.push_str(&copied_link(link));
    }
    body.push_str(&composer(page.composer));
    body.push_str(&gallery(page.gallery));
    layout("Sticky Notes", &body)
}

pub fn note_page(note: &Note) -> String {
    let body = format!(
        "<p><a href=\"/\">&larr; Back to all notes</a></p><div style=\"max-width:32rem\">{}</div>",
        card(note, false)
    );
    layout(&note.title_preview(60), &body)
}

pub fn not_found_page() -> String {
    layout(
        "Note not found",
        "<h1>Note not found</h1><p>This note doesn't exist or has been deleted.</p>\
         <p><a href=\"/\">&larr; Back to all notes</a></p>",
    )
}

fn notices(notices: &[Notice]) -> String {
    let mut html = String::new();
    for notice in notices {
        let class = match notice.level {
            NoticeLevel::Success => "success",
            NoticeLevel::Error => "error",
        };
        let _ = write!(
            html,
            "<div class=\"notice {class}\" role=\"status\"><strong>{}</strong> {}</div>",
            escape_html(&notice.title),
            escape_html(&notice.description)
        );
    }
    html
}

fn copied_link(link: &str) -> String {
    // JSON string literals are valid JS; `</` is split so it cannot close the script.
    let literal = serde_json::to_string(link)
        .unwrap_or_default()
        .replace("</", "<\\/");
    format!(
        "<p>Share link: <input readonly size=\"60\" value=\"{}\"></p>\
         <script>navigator.clipboard&&navigator.clipboard.writeText({literal}).catch(()=>{{}});</script>",
        escape_html(link)
    )
}

fn composer(composer: &Composer) -> String {
    let Some(draft) = composer.draft() else {
        return "<form class=\"composer\" method=\"post\" action=\"/composer/open\">\
                <button type=\"submit\">+ New note</button></form>"
            .to_string();
    };
    let busy = composer.phase() == ComposerPhase::Committing;
    let disabled = if busy { " disabled" } else { "" };
    let save_disabled = if busy || !composer.can_commit() {
        " disabled"
    } else {
        ""
    };

    let mut html = String::from(
        "<div class=\"composer\"><form id=\"composer-form\" method=\"post\" \
         action=\"/composer/draft\" enctype=\"multipart/form-data\">",
    );
    let _ = write!(
        html,
        "<textarea name=\"content\" placeholder=\"Write your note...\"{disabled}>{}</textarea>",
        escape_html(&draft.content)
    );
    html.push_str(&palette(draft));
    html.push_str(&staged_image(draft));
    let _ = write!(
        html,
        "<p><input type=\"file\" name=\"image\" accept=\"image/*\"{disabled}></p>\
         <button type=\"submit\" name=\"intent\" value=\"preview\"{disabled}>Update preview</button> \
         <button type=\"submit\" name=\"intent\" value=\"save\"{save_disabled}>{}</button></form>",
        if busy { "Saving..." } else { "Save note" }
    );
    if !busy {
        html.push_str(&save_toggle_script(draft.image.is_some()));
    }
    let _ = write!(
        html,
        "<form method=\"post\" action=\"/composer/cancel\">\
         <button type=\"submit\"{disabled}>Cancel</button></form></div>"
    );
    html
}

/// Re-evaluates the save button as the user types or picks a file.
fn save_toggle_script(staged_image: bool) -> String {
    format!(
        "<script>(()=>{{const f=document.getElementById('composer-form');\
         const b=f.querySelector('button[value=save]');\
         const u=()=>{{const c=f.elements.clear_image;\
         const staged={staged_image}&&!(c&&c.checked);\
         b.disabled=!(f.elements.content.value.trim()||f.elements.image.files.length||staged);}};\
         f.addEventListener('input',u);f.addEventListener('change',u);}})();</script>"
    )
}

fn palette(draft: &Draft) -> String {
    let mut html = String::from("<p>");
    for color in NoteColor::PALETTE {
        let checked = if color == draft.color { " checked" } else { "" };
        let _ = write!(
            html,
            "<label title=\"{name}\"><input type=\"radio\" name=\"color\" value=\"{hex}\"{checked}>\
             <span class=\"swatch\" style=\"background:{hex}\"></span></label> ",
            name = color.name(),
            hex = color.hex(),
        );
    }
    html.push_str("</p>");
    html
}

fn staged_image(draft: &Draft) -> String {
    let Some(image) = &draft.image else {
        return String::new();
    };
    format!(
        "<img class=\"preview\" src=\"{}\" alt=\"{}\">\
         <label><input type=\"checkbox\" name=\"clear_image\" value=\"1\"> Remove image</label>",
        escape_html(&image.preview.data_uri),
        escape_html(&image.preview.file_name)
    )
}

fn gallery(gallery: &Gallery) -> String {
    match gallery.status() {
        GalleryStatus::Loading => return "<p>Loading notes...</p>".to_string(),
        GalleryStatus::Failed => {
            return "<p>We couldn't load your notes. Refresh to try again.</p>".to_string()
        }
        GalleryStatus::Ready => {}
    }
    if gallery.is_empty() {
        return "<p>No notes yet. Create your first sticky note!</p>".to_string();
    }
    let mut html = String::from("<div class=\"grid\">");
    for note in gallery.notes() {
        html.push_str(&card(note, true));
    }
    html.push_str("</div>");
    html
}

fn card(note: &Note, with_actions: bool) -> String {
    let mut html = format!(
        "<article class=\"card\" style=\"background:{}\">",
        note.color.hex()
    );
    if let Some(url) = &note.image_url {
        let _ = write!(
            html,
            "<img src=\"{}\" alt=\"Note image\" loading=\"lazy\">",
            escape_html(url)
        );
    }
    if let Some(content) = &note.content {
        let _ = write!(html, "<p>{}</p>", escape_html(content).replace('\n', "<br>"));
    }
    let _ = write!(
        html,
        "<div class=\"meta\">{}</div>",
        note.created_at.format("%b %-d, %Y")
    );
    if with_actions {
        let _ = write!(
            html,
            "<div><a href=\"/note/{id}\">Open</a> \
             <form method=\"post\" action=\"/notes/{id}/share\"><button type=\"submit\">Share</button></form> \
             <form method=\"post\" action=\"/notes/{id}/delete\"><button type=\"submit\">Delete</button></form></div>",
            id = note.id
        );
    }
    html.push_str("</article>");
    html
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;
    use stickies_core::NoteId;

    fn note(content: &str) -> Note {
        Note {
            id: NoteId::from_uuid(Uuid::nil()),
            content: Some(content.to_string()),
            image_url: None,
            color: NoteColor::Green,
            created_at: Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html("<b>\"Tom\" & 'Jerry'</b>"),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn note_page_shows_escaped_content_and_color() {
        let html = note_page(&note("<script>hi</script>"));
        assert!(html.contains("&lt;script&gt;hi&lt;/script&gt;"));
        assert!(html.contains("background:#dcfce7"));
        assert!(html.contains("Mar 5, 2024"));
        assert!(!html.contains("/delete"));
    }

    #[test]
    fn idle_composer_offers_new_note() {
        let gallery = Gallery::new();
        let composer = Composer::new();
        let html = home_page(&HomePage {
            gallery: &gallery,
            composer: &composer,
            notices: &[],
            copied_link: None,
        });
        assert!(html.contains("/composer/open"));
        assert!(html.contains("Loading notes"));
    }

    #[test]
    fn drafting_composer_lists_whole_palette() {
        let gallery = Gallery::new();
        let mut composer = Composer::new();
        composer.open();
        let html = home_page(&HomePage {
            gallery: &gallery,
            composer: &composer,
            notices: &[Notice::note_created()],
            copied_link: Some("http://x/note/1"),
        });
        for color in NoteColor::PALETTE {
            assert!(html.contains(color.hex()));
        }
        assert!(html.contains("Note created!"));
        assert!(html.contains("value=\"save\" disabled>Save note"));
    }

    #[test]
    fn save_button_enabled_once_draft_has_text() {
        let gallery = Gallery::new();
        let mut composer = Composer::new();
        composer.open();
        composer.edit_content("Hello").unwrap();
        let html = home_page(&HomePage {
            gallery: &gallery,
            composer: &composer,
            notices: &[],
            copied_link: None,
        });
        assert!(html.contains("value=\"save\">Save note"));
        assert!(html.contains("Hello</textarea>"));
        assert!(html.contains("writeText(\"http://x/note/1\")"));
    }
}
