//! # Playback
//!
//! Drives the site's music player over four embed SDKs.
//!
//! ## Overview
//!
//! - [`kind`]: which SDK a medium plays through
//! - [`backend`]: the [`MediaBackend`] trait every SDK is wrapped in
//! - [`adapters`]: the native, YouTube, Facebook and SoundCloud wrappers
//! - [`playlist`]: named groups of on-page items for next/previous
//! - [`controller`]: [`MusicPlayerController`], the single owner of the
//!   registered backend and of [`PlaybackState`]
//!
//! ## Example
//!
//! ```ignore
//! use core_playback::{adapters::YouTubeAdapter, MusicPlayerController, PlaybackRequest};
//!
//! let session = player.register(
//!     PlaybackRequest::new(Arc::new(YouTubeAdapter::new(sdk)))
//!         .song("Intro")
//!         .in_playlist("home"),
//! )?;
//! // Forward SDK callbacks:
//! if let Some(signal) = YouTubeAdapter::signal_for_state(code) {
//!     player.dispatch(session, signal)?;
//! }
//! ```

pub mod adapters;
pub mod backend;
pub mod controller;
pub mod error;
pub mod kind;
pub mod playlist;
pub mod state;

pub use backend::{BackendSignal, LoadReport, MediaBackend, TickReport, TickSource};
pub use controller::{MusicPlayerController, PlaybackRequest, PlayerDeps, SessionId};
pub use error::{PlaybackError, Result};
pub use kind::MediaKind;
pub use playlist::{Playlist, PlaylistController, PlaylistItem};
pub use state::{PlaybackPhase, PlaybackState};
