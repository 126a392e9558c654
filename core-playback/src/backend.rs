//! # Media Backends
//!
//! One trait over the four embed SDKs the site plays media through. Each
//! adapter hides its SDK's units and quirks:
//!
//! | Kind       | Volume   | Position | Ticks  | Autoplay on ready |
//! |------------|----------|----------|--------|-------------------|
//! | Native     | 0..1     | seconds  | pushed | no                |
//! | YouTube    | 0..100   | seconds  | polled | no                |
//! | Facebook   | 0..1     | seconds  | polled | no                |
//! | SoundCloud | 0..1     | ms       | pushed | yes               |
//!
//! The controller always speaks seconds and `0.0..=1.0` volume.
//!
//! SDK callbacks are translated to [`BackendSignal`]s by each adapter's
//! `signal_for_*` function; the host forwards them to
//! [`MusicPlayerController::dispatch`](crate::controller::MusicPlayerController::dispatch).

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::kind::MediaKind;

/// How position updates reach the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickSource {
    /// The controller polls `report_tick` on an interval while playing.
    Polled,
    /// The SDK emits progress events itself.
    Pushed,
}

/// Normalized SDK callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendSignal {
    /// The SDK handle is usable.
    Ready,
    /// Metadata (duration) is available.
    Load,
    Tick,
    /// Playback actually started.
    Play,
    Pause,
    End,
}

/// Position sample taken on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    pub current_time: f64,
    /// `None` when the SDK cannot report buffering.
    pub buffer_percent: Option<f64>,
    /// Some SDKs refine the duration while playing.
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoadReport {
    pub duration: f64,
}

/// Control surface shared by every embed.
///
/// Positions are seconds, volume is `0.0..=1.0`. Implementations must not
/// start playback when they become ready unless
/// [`autoplays_on_ready`](Self::autoplays_on_ready) says so.
pub trait MediaBackend: Send + Sync {
    fn kind(&self) -> MediaKind;

    fn tick_source(&self) -> TickSource;

    fn autoplays_on_ready(&self) -> bool {
        false
    }

    fn play(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    fn seek(&self, seconds: f64) -> Result<()>;

    fn set_volume(&self, volume: f64) -> Result<()>;

    fn report_tick(&self) -> TickReport;

    fn report_load(&self) -> LoadReport;

    /// Final position when the media ended.
    fn report_end(&self) -> f64;

    /// Release SDK resources. Called once, when the backend is replaced,
    /// reset or fails to load.
    fn teardown(&self);
}

/// Non-finite or negative SDK numbers read as zero.
pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
