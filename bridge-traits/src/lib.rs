//! # Host Bridge Traits
//!
//! Contracts between the NestedBird client core and whatever hosts it: a
//! browser shell, a desktop webview, or a headless test harness.
//!
//! ## Traits
//!
//! ### Data
//! - [`HttpClient`](http::HttpClient) - Site API transport
//! - [`SessionProvider`](session::SessionProvider) - Reactive auth getters used by route gating
//!
//! ### Document
//! - [`DocumentHost`](document::DocumentHost) - Location, history, title and meta tags
//! - [`NotificationSink`](notification::NotificationSink) - Transient user notifications
//!
//! ### Playback
//! - [`TimerScheduler`](timer::TimerScheduler) - Interval/one-shot timers for SDK polling
//! - [`NativeAudioElement`](media::NativeAudioElement), [`YouTubePlayer`](media::YouTubePlayer),
//!   [`SoundCloudWidget`](media::SoundCloudWidget), [`FacebookVideo`](media::FacebookVideo) -
//!   Embed SDK surfaces
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing:
//!
//! ```ignore
//! let http_client = builder.http_client.ok_or_else(|| Error::CapabilityMissing {
//!     capability: "HttpClient".to_string(),
//!     message: "No HTTP client implementation provided.".to_string(),
//! })?;
//! ```
//!
//! ## Thread Safety
//!
//! Native targets require `Send + Sync` through
//! [`PlatformSendSync`](platform::PlatformSendSync); on `wasm32` the bound is
//! dropped because browser handles are single-threaded.

pub mod document;
pub mod error;
pub mod http;
pub mod media;
pub mod notification;
pub mod platform;
pub mod session;
pub mod time;
pub mod timer;

pub use error::BridgeError;

pub use document::DocumentHost;
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use media::{FacebookVideo, NativeAudioElement, SoundCloudWidget, YouTubePlayer};
pub use notification::{Notification, NotificationSink};
pub use session::SessionProvider;
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
pub use timer::{ManualTimerScheduler, TimerCallback, TimerId, TimerScheduler};
