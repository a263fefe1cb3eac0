use std::collections::HashMap;
use std::env;
use std::io::{self, IsTerminal, Read};

use chrono::{DateTime, Utc};
use serde::Serialize;
use stickies_core::config::GatewayConfig;
use stickies_core::gateway::Gateway;
use stickies_core::media::ImageUploader;
use stickies_core::notify::{Clipboard, Notice, NoticeLevel, Notifier};
use stickies_core::repository::NoteRepository;
use stickies_core::share::ShareResolver;
use stickies_core::util::is_http_url;
use stickies_core::{Note, NoteId};

use crate::error::CliError;

const DEFAULT_PUBLIC_ORIGIN: &str = "http://127.0.0.1:8080";

/// A connected gateway plus the origin share links point at.
pub struct Session {
    gateway: Gateway,
    origin: String,
}

impl Session {
    pub fn from_env() -> Result<Self, CliError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    /// Requires a hosted gateway; local in-memory mode is refused.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CliError> {
        let config = GatewayConfig::from_lookup(&lookup)?;
        if config.is_local() {
            return Err(CliError::Config(
                "SUPABASE_URL and SUPABASE_ANON_KEY must be set to store notes".to_string(),
            ));
        }
        let origin = lookup("STICKIES_PUBLIC_ORIGIN")
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_PUBLIC_ORIGIN.to_string());
        if !is_http_url(&origin) {
            return Err(CliError::Config(
                "STICKIES_PUBLIC_ORIGIN must start with http:// or https://".to_string(),
            ));
        }
        tracing::debug!(origin = %origin, "Connecting to storage gateway");
        let gateway = Gateway::connect(&config, &format!("{origin}/blobs"))?;
        Ok(Self::new(gateway, origin))
    }

    pub fn new(gateway: Gateway, origin: impl Into<String>) -> Self {
        Self {
            gateway,
            origin: origin.into(),
        }
    }

    pub fn repository(&self) -> NoteRepository {
        self.gateway.repository()
    }

    pub fn uploader(&self) -> ImageUploader {
        self.gateway.uploader()
    }

    pub fn share_resolver(&self) -> ShareResolver {
        ShareResolver::new(self.repository(), self.origin.clone())
    }
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub preview: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub relative_time: String,
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now = Utc::now();
    notes
        .iter()
        .map(|note| {
            let id = note.id.to_string();
            let short_id = id.chars().take(13).collect::<String>();
            let preview = note_preview(note, 40);
            let relative_time = format_relative_time(note.created_at, now);
            let color = note.color.name();

            if note.image_url.is_some() {
                format!("{short_id:<13}  {color:<7}  {preview:<40}  {relative_time:<10}  [image]")
            } else {
                format!("{short_id:<13}  {color:<7}  {preview:<40}  {relative_time}")
            }
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    NoteListItem {
        id: note.id.to_string(),
        preview: note_preview(note, 80),
        content: note.content.clone(),
        image_url: note.image_url.clone(),
        color: note.color.hex().to_string(),
        created_at: note.created_at,
        relative_time: format_relative_time(note.created_at, Utc::now()),
    }
}

pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let first_line = note.text().lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() && note.image_url.is_some() {
        return "(image)".to_string();
    }
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - timestamp).num_milliseconds().max(0);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn parse_note_id(id: &str) -> Result<NoteId, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(CliError::EmptyNoteId);
    }
    trimmed
        .parse()
        .map_err(|_| CliError::InvalidNoteId(trimmed.to_string()))
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

/// Notices go to stderr so stdout stays scriptable.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => eprintln!("{}", notice.title),
            NoticeLevel::Error => eprintln!("{}: {}", notice.title, notice.description),
        }
    }
}

/// A terminal has no clipboard we can rely on; the link is printed instead.
pub struct StdoutClipboard;

impl Clipboard for StdoutClipboard {
    fn copy_text(&self, text: &str) {
        println!("{text}");
    }
}
