use std::sync::Arc;

use bridge_traits::media::SoundCloudWidget;

use crate::backend::{finite_or_zero, BackendSignal, LoadReport, MediaBackend, TickReport, TickSource};
use crate::error::Result;
use crate::kind::MediaKind;

/// The SoundCloud widget. It pushes `playProgress` itself and starts playing
/// as soon as it is ready.
pub struct SoundCloudAdapter {
    widget: Arc<dyn SoundCloudWidget>,
}

impl SoundCloudAdapter {
    pub fn new(widget: Arc<dyn SoundCloudWidget>) -> Self {
        Self { widget }
    }

    /// Translate a `SC.Widget.Events` name.
    pub fn signal_for_event(event: &str) -> Option<BackendSignal> {
        match event {
            "ready" => Some(BackendSignal::Ready),
            "play" => Some(BackendSignal::Play),
            "pause" => Some(BackendSignal::Pause),
            "finish" => Some(BackendSignal::End),
            "playProgress" => Some(BackendSignal::Tick),
            _ => None,
        }
    }

    fn seconds(ms: f64) -> f64 {
        finite_or_zero(ms) / 1000.0
    }
}

impl MediaBackend for SoundCloudAdapter {
    fn kind(&self) -> MediaKind {
        MediaKind::SoundCloud
    }

    fn tick_source(&self) -> TickSource {
        TickSource::Pushed
    }

    fn autoplays_on_ready(&self) -> bool {
        true
    }

    fn play(&self) -> Result<()> {
        Ok(self.widget.play()?)
    }

    fn pause(&self) -> Result<()> {
        Ok(self.widget.pause()?)
    }

    fn seek(&self, seconds: f64) -> Result<()> {
        Ok(self.widget.seek_to((finite_or_zero(seconds) * 1000.0).round() as u64)?)
    }

    fn set_volume(&self, volume: f64) -> Result<()> {
        Ok(self.widget.set_volume(volume)?)
    }

    fn report_tick(&self) -> TickReport {
        TickReport {
            current_time: Self::seconds(self.widget.position_ms()),
            buffer_percent: Some((finite_or_zero(self.widget.loaded_progress()) * 100.0).floor()),
            duration: Some(Self::seconds(self.widget.duration_ms())).filter(|d| *d > 0.0),
        }
    }

    fn report_load(&self) -> LoadReport {
        LoadReport {
            duration: Self::seconds(self.widget.duration_ms()),
        }
    }

    fn report_end(&self) -> f64 {
        Self::seconds(self.widget.position_ms())
    }

    fn teardown(&self) {
        self.widget.unbind_all();
    }
}
