use std::sync::Arc;

use bridge_traits::media::NativeAudioElement;

use crate::backend::{finite_or_zero, BackendSignal, LoadReport, MediaBackend, TickReport, TickSource};
use crate::error::Result;
use crate::kind::MediaKind;

/// An `<audio>`/`<video>` element.
pub struct NativeAdapter {
    element: Arc<dyn NativeAudioElement>,
}

impl NativeAdapter {
    pub fn new(element: Arc<dyn NativeAudioElement>) -> Self {
        Self { element }
    }

    /// Translate a DOM media event name.
    pub fn signal_for_event(event: &str) -> Option<BackendSignal> {
        match event {
            "canplay" => Some(BackendSignal::Ready),
            "loadedmetadata" => Some(BackendSignal::Load),
            "timeupdate" | "progress" => Some(BackendSignal::Tick),
            "play" | "playing" => Some(BackendSignal::Play),
            "pause" => Some(BackendSignal::Pause),
            "ended" => Some(BackendSignal::End),
            _ => None,
        }
    }

    fn buffer_percent(&self) -> Option<f64> {
        let duration = finite_or_zero(self.element.duration());
        (duration > 0.0).then(|| {
            (finite_or_zero(self.element.buffered_end()) / duration * 100.0).clamp(0.0, 100.0)
        })
    }
}

impl MediaBackend for NativeAdapter {
    fn kind(&self) -> MediaKind {
        MediaKind::Native
    }

    fn tick_source(&self) -> TickSource {
        TickSource::Pushed
    }

    fn play(&self) -> Result<()> {
        Ok(self.element.play()?)
    }

    fn pause(&self) -> Result<()> {
        Ok(self.element.pause()?)
    }

    fn seek(&self, seconds: f64) -> Result<()> {
        Ok(self.element.set_current_time(seconds)?)
    }

    fn set_volume(&self, volume: f64) -> Result<()> {
        Ok(self.element.set_volume(volume)?)
    }

    fn report_tick(&self) -> TickReport {
        let duration = finite_or_zero(self.element.duration());
        TickReport {
            current_time: finite_or_zero(self.element.current_time()),
            buffer_percent: self.buffer_percent(),
            duration: (duration > 0.0).then_some(duration),
        }
    }

    fn report_load(&self) -> LoadReport {
        LoadReport {
            duration: finite_or_zero(self.element.duration()),
        }
    }

    fn report_end(&self) -> f64 {
        finite_or_zero(self.element.current_time())
    }

    fn teardown(&self) {
        self.element.unload();
    }
}
