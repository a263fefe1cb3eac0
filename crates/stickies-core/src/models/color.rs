//! The fixed sticky-note palette

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// One of the eight background colors a note can have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NoteColor {
    #[default]
    Yellow,
    Green,
    Pink,
    Blue,
    Purple,
    Rose,
    Orange,
    Teal,
}

impl NoteColor {
    /// Every palette entry, in picker order. The first entry is the default.
    pub const PALETTE: [Self; 8] = [
        Self::Yellow,
        Self::Green,
        Self::Pink,
        Self::Blue,
        Self::Purple,
        Self::Rose,
        Self::Orange,
        Self::Teal,
    ];

    /// Lowercase `#rrggbb` form, as stored in the record store.
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Yellow => "#fef3c7",
            Self::Green => "#dcfce7",
            Self::Pink => "#fce7f3",
            Self::Blue => "#e0e7ff",
            Self::Purple => "#f3e8ff",
            Self::Rose => "#fed7e2",
            Self::Orange => "#fef2e2",
            Self::Teal => "#f0fdfa",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Pink => "pink",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Rose => "rose",
            Self::Orange => "orange",
            Self::Teal => "teal",
        }
    }
}

impl fmt::Display for NoteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hex())
    }
}

impl FromStr for NoteColor {
    type Err = ValidationError;

    /// Accepts either the hex value (case-insensitive) or the color name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::PALETTE
            .into_iter()
            .find(|color| {
                color.hex().eq_ignore_ascii_case(wanted) || color.name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ValidationError::InvalidColor(wanted.to_string()))
    }
}

impl Serialize for NoteColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.hex())
    }
}

impl<'de> Deserialize<'de> for NoteColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
