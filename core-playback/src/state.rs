//! Reactive player state.

use serde::{Deserialize, Serialize};

use crate::kind::MediaKind;

/// Lifecycle of the registered backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
    /// The backend never became ready.
    Failed,
}

/// Everything the player UI renders. Only the controller writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// `0..=100`.
    pub buffer_percent: f64,
    /// Seconds.
    pub current_time: f64,
    /// Seconds.
    pub duration: f64,
    /// `0.0..=1.0`.
    pub volume: f64,
    pub paused: bool,
    pub song_name: String,
    pub artist_name: String,
    pub playable: bool,
    pub playlist_name: String,
    #[serde(rename = "type")]
    pub media_type: MediaKind,
    pub phase: PlaybackPhase,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            buffer_percent: 0.0,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            paused: true,
            song_name: String::new(),
            artist_name: String::new(),
            playable: false,
            playlist_name: String::new(),
            media_type: MediaKind::None,
            phase: PlaybackPhase::Idle,
        }
    }
}

impl PlaybackState {
    /// Elapsed share of the media, `0.0..=1.0`; zero while the duration is
    /// unknown.
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn elapsed_label(&self) -> String {
        clock_label(self.current_time)
    }

    pub fn duration_label(&self) -> String {
        clock_label(self.duration)
    }
}

/// `m:ss` with seconds floored.
pub fn clock_label(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
