use std::sync::Arc;

use bridge_traits::media::FacebookVideo;

use crate::backend::{finite_or_zero, BackendSignal, LoadReport, MediaBackend, TickReport, TickSource};
use crate::error::Result;
use crate::kind::MediaKind;

/// A Facebook embedded video. Position is polled.
pub struct FacebookAdapter {
    video: Arc<dyn FacebookVideo>,
}

impl FacebookAdapter {
    pub fn new(video: Arc<dyn FacebookVideo>) -> Self {
        Self { video }
    }

    /// `xfbml.ready` fires for every parsed plugin; only videos are ours.
    pub fn signal_for_ready(plugin_type: &str) -> Option<BackendSignal> {
        (plugin_type == "video").then_some(BackendSignal::Ready)
    }

    /// Translate a video instance subscription event.
    pub fn signal_for_event(event: &str) -> Option<BackendSignal> {
        match event {
            "startedPlaying" => Some(BackendSignal::Play),
            "paused" => Some(BackendSignal::Pause),
            "finishedPlaying" => Some(BackendSignal::End),
            _ => None,
        }
    }
}

impl MediaBackend for FacebookAdapter {
    fn kind(&self) -> MediaKind {
        MediaKind::Facebook
    }

    fn tick_source(&self) -> TickSource {
        TickSource::Polled
    }

    fn play(&self) -> Result<()> {
        Ok(self.video.play()?)
    }

    fn pause(&self) -> Result<()> {
        Ok(self.video.pause()?)
    }

    fn seek(&self, seconds: f64) -> Result<()> {
        Ok(self.video.seek(seconds)?)
    }

    fn set_volume(&self, volume: f64) -> Result<()> {
        Ok(self.video.set_volume(volume)?)
    }

    fn report_tick(&self) -> TickReport {
        let duration = finite_or_zero(self.video.get_duration());
        TickReport {
            current_time: finite_or_zero(self.video.get_current_position()),
            buffer_percent: None,
            duration: (duration > 0.0).then_some(duration),
        }
    }

    fn report_load(&self) -> LoadReport {
        LoadReport {
            duration: finite_or_zero(self.video.get_duration()),
        }
    }

    fn report_end(&self) -> f64 {
        finite_or_zero(self.video.get_current_position())
    }

    fn teardown(&self) {
        self.video.release_subscriptions();
    }
}
