use std::sync::Arc;

use bridge_traits::media::YouTubePlayer;

use crate::backend::{finite_or_zero, BackendSignal, LoadReport, MediaBackend, TickReport, TickSource};
use crate::error::Result;
use crate::kind::MediaKind;

/// `YT.PlayerState` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YouTubeState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl YouTubeState {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(YouTubeState::Unstarted),
            0 => Some(YouTubeState::Ended),
            1 => Some(YouTubeState::Playing),
            2 => Some(YouTubeState::Paused),
            3 => Some(YouTubeState::Buffering),
            5 => Some(YouTubeState::Cued),
            _ => None,
        }
    }
}

/// The YouTube IFrame player. Position is polled.
pub struct YouTubeAdapter {
    player: Arc<dyn YouTubePlayer>,
}

impl YouTubeAdapter {
    pub fn new(player: Arc<dyn YouTubePlayer>) -> Self {
        Self { player }
    }

    /// Translate an `onStateChange` code. Buffering, cued and unstarted
    /// carry no signal.
    pub fn signal_for_state(code: i32) -> Option<BackendSignal> {
        match YouTubeState::from_code(code)? {
            YouTubeState::Ended => Some(BackendSignal::End),
            YouTubeState::Playing => Some(BackendSignal::Play),
            YouTubeState::Paused => Some(BackendSignal::Pause),
            _ => None,
        }
    }

    /// The SDK takes an integer volume in `0..=100`.
    pub fn sdk_volume(volume: f64) -> u8 {
        (volume.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

impl MediaBackend for YouTubeAdapter {
    fn kind(&self) -> MediaKind {
        MediaKind::YouTube
    }

    fn tick_source(&self) -> TickSource {
        TickSource::Polled
    }

    fn play(&self) -> Result<()> {
        Ok(self.player.play_video()?)
    }

    fn pause(&self) -> Result<()> {
        Ok(self.player.pause_video()?)
    }

    fn seek(&self, seconds: f64) -> Result<()> {
        Ok(self.player.seek_to(seconds, true)?)
    }

    fn set_volume(&self, volume: f64) -> Result<()> {
        Ok(self.player.set_volume(Self::sdk_volume(volume))?)
    }

    fn report_tick(&self) -> TickReport {
        TickReport {
            current_time: finite_or_zero(self.player.get_current_time()),
            buffer_percent: Some(
                (finite_or_zero(self.player.get_video_loaded_fraction()) * 100.0).floor(),
            ),
            duration: None,
        }
    }

    fn report_load(&self) -> LoadReport {
        LoadReport {
            duration: finite_or_zero(self.player.get_duration()),
        }
    }

    fn report_end(&self) -> f64 {
        finite_or_zero(self.player.get_current_time())
    }

    fn teardown(&self) {
        self.player.stop_video();
    }
}
