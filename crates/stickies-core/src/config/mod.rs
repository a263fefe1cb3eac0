//! Gateway configuration shared by the web server and the CLI.
//!
//! Everything is read from the process environment (after `.env` has been
//! loaded by the binary). Secrets never appear in `Debug` output.

use std::time::Duration;

use crate::gateway::{R2Config, SupabaseConfig};
use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
const ENV_NOTES_TABLE: &str = "STICKIES_NOTES_TABLE";
const ENV_IMAGE_BUCKET: &str = "STICKIES_IMAGE_BUCKET";
const ENV_HTTP_TIMEOUT_SECS: &str = "STICKIES_HTTP_TIMEOUT_SECS";

pub const DEFAULT_NOTES_TABLE: &str = "notes";
pub const DEFAULT_IMAGE_BUCKET: &str = "note-images";
const MAX_HTTP_TIMEOUT_SECS: u64 = 300;

/// Where notes and images live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Hosted record store (and default blob store). `None` means local mode.
    pub supabase: Option<SupabaseConfig>,
    /// Optional R2 bucket replacing Supabase Storage for images.
    pub r2: Option<R2Config>,
    /// Per-request timeout for gateway HTTP calls.
    pub http_timeout: Option<Duration>,
}

impl GatewayConfig {
    /// Read from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |name: &str| normalize_text_option(lookup(name));

        let supabase = match (read(ENV_SUPABASE_URL), read(ENV_SUPABASE_ANON_KEY)) {
            (None, None) => None,
            (Some(url), Some(anon_key)) => {
                if !is_http_url(&url) {
                    return Err(Error::Config(format!(
                        "{ENV_SUPABASE_URL} must start with http:// or https://"
                    )));
                }
                Some(SupabaseConfig {
                    url: url.trim_end_matches('/').to_string(),
                    anon_key,
                    notes_table: read(ENV_NOTES_TABLE)
                        .unwrap_or_else(|| DEFAULT_NOTES_TABLE.to_string()),
                    image_bucket: read(ENV_IMAGE_BUCKET)
                        .unwrap_or_else(|| DEFAULT_IMAGE_BUCKET.to_string()),
                })
            }
            (Some(_), None) => {
                return Err(Error::Config(format!(
                    "{ENV_SUPABASE_ANON_KEY} is required when {ENV_SUPABASE_URL} is set"
                )));
            }
            (None, Some(_)) => {
                return Err(Error::Config(format!(
                    "{ENV_SUPABASE_URL} is required when {ENV_SUPABASE_ANON_KEY} is set"
                )));
            }
        };

        let r2 = R2Config::from_lookup(&lookup)?;
        if r2.is_some() && supabase.is_none() {
            return Err(Error::Config(format!(
                "R2 image storage needs a record store; set {ENV_SUPABASE_URL} as well"
            )));
        }

        let http_timeout = read(ENV_HTTP_TIMEOUT_SECS)
            .map(|raw| parse_timeout_secs(&raw))
            .transpose()?;

        Ok(Self {
            supabase,
            r2,
            http_timeout,
        })
    }

    /// Whether notes are kept in process memory only.
    pub const fn is_local(&self) -> bool {
        self.supabase.is_none()
    }
}

fn parse_timeout_secs(raw: &str) -> Result<Duration> {
    let secs = raw.parse::<u64>().map_err(|_| {
        Error::Config(format!(
            "{ENV_HTTP_TIMEOUT_SECS} must be a whole number of seconds, got '{raw}'"
        ))
    })?;
    if !(1..=MAX_HTTP_TIMEOUT_SECS).contains(&secs) {
        return Err(Error::Config(format!(
            "{ENV_HTTP_TIMEOUT_SECS} must be between 1 and {MAX_HTTP_TIMEOUT_SECS}"
        )));
    }
    Ok(Duration::from_secs(secs))
}
