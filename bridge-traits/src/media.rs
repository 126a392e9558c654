//! Third-party media SDK surfaces.
//!
//! Each trait mirrors the subset of an embed SDK that the playback adapters
//! drive. Units are the SDK's own: YouTube volume is `0..=100`, SoundCloud
//! positions are milliseconds, everything else uses seconds and `0.0..=1.0`
//! volume. Normalisation happens in `core-playback`, never here.

use crate::error::Result;
use crate::platform::PlatformSendSync;

/// An HTML media element (`<audio>`/`<video>`).
pub trait NativeAudioElement: PlatformSendSync {
    fn play(&self) -> Result<()>;
    fn pause(&self) -> Result<()>;
    fn set_current_time(&self, seconds: f64) -> Result<()>;
    fn set_volume(&self, volume: f64) -> Result<()>;
    fn current_time(&self) -> f64;
    /// `NaN` until metadata has loaded.
    fn duration(&self) -> f64;
    /// End of the last buffered range in seconds.
    fn buffered_end(&self) -> f64;
    /// Drop the source so the element stops fetching.
    fn unload(&self);
}

/// The YouTube IFrame player.
pub trait YouTubePlayer: PlatformSendSync {
    fn play_video(&self) -> Result<()>;
    fn pause_video(&self) -> Result<()>;
    fn seek_to(&self, seconds: f64, allow_seek_ahead: bool) -> Result<()>;
    fn set_volume(&self, volume: u8) -> Result<()>;
    fn get_volume(&self) -> u8;
    fn get_current_time(&self) -> f64;
    fn get_duration(&self) -> f64;
    /// Fraction of the video buffered, `0.0..=1.0`.
    fn get_video_loaded_fraction(&self) -> f64;
    fn stop_video(&self);
}

/// The SoundCloud widget API.
pub trait SoundCloudWidget: PlatformSendSync {
    fn play(&self) -> Result<()>;
    fn pause(&self) -> Result<()>;
    fn seek_to(&self, milliseconds: u64) -> Result<()>;
    fn set_volume(&self, volume: f64) -> Result<()>;
    fn position_ms(&self) -> f64;
    fn duration_ms(&self) -> f64;
    /// Fraction of the sound loaded, `0.0..=1.0`.
    fn loaded_progress(&self) -> f64;
    fn unbind_all(&self);
}

/// A Facebook embedded video player instance.
pub trait FacebookVideo: PlatformSendSync {
    fn play(&self) -> Result<()>;
    fn pause(&self) -> Result<()>;
    fn seek(&self, seconds: f64) -> Result<()>;
    fn set_volume(&self, volume: f64) -> Result<()>;
    fn get_current_position(&self) -> f64;
    fn get_duration(&self) -> f64;
    fn release_subscriptions(&self);
}
