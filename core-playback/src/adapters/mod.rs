//! The four [`MediaBackend`](crate::backend::MediaBackend) implementations.

mod facebook;
mod native;
mod soundcloud;
mod youtube;

pub use facebook::FacebookAdapter;
pub use native::NativeAdapter;
pub use soundcloud::SoundCloudAdapter;
pub use youtube::{YouTubeAdapter, YouTubeState};
