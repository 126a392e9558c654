//! Media backend kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PlaybackError;

/// Which embed SDK drives the current media. Serializes as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum MediaKind {
    #[default]
    None,
    Native,
    YouTube,
    Facebook,
    SoundCloud,
}

impl MediaKind {
    pub const ALL: [MediaKind; 5] = [
        MediaKind::None,
        MediaKind::Native,
        MediaKind::YouTube,
        MediaKind::Facebook,
        MediaKind::SoundCloud,
    ];

    pub fn code(self) -> i64 {
        match self {
            MediaKind::None => -1,
            MediaKind::Native => 0,
            MediaKind::YouTube => 1,
            MediaKind::Facebook => 2,
            MediaKind::SoundCloud => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Embeds the site can play, by their server-side type names.
    pub fn supported_embeds() -> [MediaKind; 3] {
        [MediaKind::YouTube, MediaKind::Facebook, MediaKind::SoundCloud]
    }

    /// Server-side type name of an embed kind (`"YOUTUBE"`).
    pub fn embed_name(self) -> Option<&'static str> {
        match self {
            MediaKind::YouTube => Some("YOUTUBE"),
            MediaKind::Facebook => Some("FACEBOOK"),
            MediaKind::SoundCloud => Some("SOUNDCLOUD"),
            MediaKind::None | MediaKind::Native => None,
        }
    }

    pub fn from_embed_name(name: &str) -> Option<Self> {
        Self::supported_embeds()
            .into_iter()
            .find(|kind| kind.embed_name().is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }

    pub fn name(self) -> &'static str {
        match self {
            MediaKind::None => "None",
            MediaKind::Native => "Native",
            MediaKind::YouTube => "YouTube",
            MediaKind::Facebook => "Facebook",
            MediaKind::SoundCloud => "SoundCloud",
        }
    }
}

impl From<MediaKind> for i64 {
    fn from(kind: MediaKind) -> Self {
        kind.code()
    }
}

impl TryFrom<i64> for MediaKind {
    type Error = PlaybackError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        MediaKind::from_code(code).ok_or(PlaybackError::UnknownMediaKind(code))
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
