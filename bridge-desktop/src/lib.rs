//! # Desktop Bridge Implementations
//!
//! Native implementations of the host bridges, for desktop shells and
//! headless runs of the client core:
//! - `HttpClient` using `reqwest`
//! - `TimerScheduler` using spawned Tokio tasks
//! - `DocumentHost` as an in-memory location/history/meta model
//! - `NotificationSink` writing to `tracing`
//! - `SessionProvider` with a host-managed role set
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HeadlessDocument, ReqwestHttpClient, TokioTimerScheduler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = ReqwestHttpClient::new()?.with_base_url("https://www.soundofjersey.com");
//!     let timers = TokioTimerScheduler::new();
//!     let document = HeadlessDocument::new("/Events");
//!     // Hand these to CoreConfig::builder()
//!     Ok(())
//! }
//! ```

mod document;
mod http;
mod notifications;
mod session;
mod timer;

pub use document::HeadlessDocument;
pub use http::ReqwestHttpClient;
pub use notifications::TracingNotificationSink;
pub use session::StaticSession;
pub use timer::TokioTimerScheduler;
