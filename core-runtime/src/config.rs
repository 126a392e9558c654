//! # Core Configuration Module
//!
//! Settings and host bridges for the NestedBird client core.
//!
//! `CoreConfig` is built with [`CoreConfigBuilder`], which fails fast with an
//! actionable message when a required bridge is missing or a setting is out
//! of range.
//!
//! ## Required Bridges
//!
//! - `HttpClient` - site API transport
//! - `SessionProvider` - role set for route gating
//! - `NotificationSink` - user-visible notifications
//! - `DocumentHost` - location, history, title and meta tags
//! - `TimerScheduler` - SDK polling and load timeouts
//!
//! With the `desktop-shims` feature, missing `HttpClient`, `TimerScheduler`,
//! `DocumentHost` and `NotificationSink` are filled with `bridge-desktop`
//! defaults. The session is always the host's.
//!
//! ## Optional Bridges
//!
//! - `Clock` - defaults to the system clock
//! - `LoggerSink` - mirror of tracing output for the host
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .site_origin("https://www.soundofjersey.com")
//!     .session(Arc::new(my_session))
//!     .http_client(Arc::new(my_http))
//!     .notifications(Arc::new(my_notifications))
//!     .document(Arc::new(my_document))
//!     .timers(Arc::new(my_timers))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use bridge_traits::{
    Clock, DocumentHost, HttpClient, LoggerSink, NotificationSink, SessionProvider, SystemClock,
    TimerScheduler,
};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "/api/v1";
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_TITLE_MAX_CHARS: usize = 60;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(25);
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_PAGE_SIZE: u32 = 15;

/// Largest page the site API serves.
const MAX_PAGE_SIZE: u32 = 100;

/// Core configuration. Use [`CoreConfig::builder`] to construct.
#[derive(Clone)]
pub struct CoreConfig {
    /// Prefix for every API endpoint, e.g. `/api/v1`.
    pub api_base_url: String,

    /// Where Forbidden navigations are sent. Must resolve to an ungated route.
    pub login_path: String,

    /// Scheme and host used for canonical URLs (`og:url`).
    pub site_origin: String,

    /// Page titles are cut to this many characters.
    pub title_max_chars: usize,

    /// Tick polling period for backends that do not push position updates.
    pub poll_interval: Duration,

    /// How long a registered backend may take to become ready. `None` waits
    /// forever.
    pub load_timeout: Option<Duration>,

    pub event_buffer_size: usize,

    /// Default `limit` for paged API requests.
    pub page_size: u32,

    pub http_client: Arc<dyn HttpClient>,
    pub session: Arc<dyn SessionProvider>,
    pub notifications: Arc<dyn NotificationSink>,
    pub document: Arc<dyn DocumentHost>,
    pub timers: Arc<dyn TimerScheduler>,
    pub clock: Arc<dyn Clock>,
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("api_base_url", &self.api_base_url)
            .field("login_path", &self.login_path)
            .field("site_origin", &self.site_origin)
            .field("title_max_chars", &self.title_max_chars)
            .field("poll_interval", &self.poll_interval)
            .field("load_timeout", &self.load_timeout)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("page_size", &self.page_size)
            .field("http_client", &"HttpClient { ... }")
            .field("session", &"SessionProvider { ... }")
            .field("notifications", &"NotificationSink { ... }")
            .field("document", &"DocumentHost { ... }")
            .field("timers", &"TimerScheduler { ... }")
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Default logging settings, mirrored into the host logger sink when one
    /// is configured.
    pub fn logging(&self) -> LoggingConfig {
        let logging = LoggingConfig::default();
        match &self.logger_sink {
            Some(sink) => logging.with_logger_sink(Arc::clone(sink)),
            None => logging,
        }
    }

    /// Checks every setting. Called by [`CoreConfigBuilder::build`].
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.is_empty() {
            return Err(Error::invalid("api_base_url", "cannot be empty"));
        }
        if self.api_base_url.ends_with('/') {
            return Err(Error::invalid(
                "api_base_url",
                format!("`{}` must not end with `/`", self.api_base_url),
            ));
        }

        if !self.login_path.starts_with('/') {
            return Err(Error::invalid(
                "login_path",
                format!("`{}` must be an absolute path", self.login_path),
            ));
        }

        if !self.site_origin.is_empty()
            && !(self.site_origin.starts_with("http://") || self.site_origin.starts_with("https://"))
        {
            return Err(Error::invalid(
                "site_origin",
                format!("`{}` must start with http:// or https://", self.site_origin),
            ));
        }

        if self.title_max_chars == 0 {
            return Err(Error::invalid("title_max_chars", "must be greater than 0"));
        }

        if self.poll_interval.is_zero() || self.poll_interval > Duration::from_secs(1) {
            return Err(Error::invalid(
                "poll_interval",
                format!("{:?} is outside 1ms..=1s", self.poll_interval),
            ));
        }

        if matches!(self.load_timeout, Some(timeout) if timeout.is_zero()) {
            return Err(Error::invalid(
                "load_timeout",
                "must be greater than 0; use None to disable",
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::invalid("event_buffer_size", "must be greater than 0"));
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::invalid(
                "page_size",
                format!("{} is outside 1..={}", self.page_size, MAX_PAGE_SIZE),
            ));
        }

        Ok(())
    }

    /// `api_base_url` joined with `path`.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

fn capability_missing(capability: &str, purpose: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{} implementation is required for {}. \
             Desktop: enable the 'desktop-shims' feature to use the bridge-desktop default. \
             Web: inject the browser-backed implementation.",
            capability, purpose
        ),
    }
}

#[cfg(feature = "desktop-shims")]
mod defaults {
    use super::*;
    use bridge_desktop::{
        HeadlessDocument, ReqwestHttpClient, TokioTimerScheduler, TracingNotificationSink,
    };

    pub(super) fn http_client(site_origin: &str) -> Result<Arc<dyn HttpClient>> {
        let client = ReqwestHttpClient::new()
            .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
        let client = if site_origin.is_empty() {
            client
        } else {
            client.with_base_url(site_origin)
        };
        Ok(Arc::new(client))
    }

    pub(super) fn timers() -> Result<Arc<dyn TimerScheduler>> {
        Ok(Arc::new(TokioTimerScheduler::new()))
    }

    pub(super) fn document() -> Result<Arc<dyn DocumentHost>> {
        Ok(Arc::new(HeadlessDocument::default()))
    }

    pub(super) fn notifications() -> Result<Arc<dyn NotificationSink>> {
        Ok(Arc::new(TracingNotificationSink::new()))
    }
}

#[cfg(not(feature = "desktop-shims"))]
mod defaults {
    use super::*;

    pub(super) fn http_client(_site_origin: &str) -> Result<Arc<dyn HttpClient>> {
        Err(capability_missing("HttpClient", "site API requests"))
    }

    pub(super) fn timers() -> Result<Arc<dyn TimerScheduler>> {
        Err(capability_missing(
            "TimerScheduler",
            "media polling and load timeouts",
        ))
    }

    pub(super) fn document() -> Result<Arc<dyn DocumentHost>> {
        Err(capability_missing(
            "DocumentHost",
            "location, history and page titles",
        ))
    }

    pub(super) fn notifications() -> Result<Arc<dyn NotificationSink>> {
        Err(capability_missing(
            "NotificationSink",
            "user-visible notifications",
        ))
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    api_base_url: Option<String>,
    login_path: Option<String>,
    site_origin: Option<String>,
    title_max_chars: Option<usize>,
    poll_interval: Option<Duration>,
    load_timeout: Option<Option<Duration>>,
    event_buffer_size: Option<usize>,
    page_size: Option<u32>,
    http_client: Option<Arc<dyn HttpClient>>,
    session: Option<Arc<dyn SessionProvider>>,
    notifications: Option<Arc<dyn NotificationSink>>,
    document: Option<Arc<dyn DocumentHost>>,
    timers: Option<Arc<dyn TimerScheduler>>,
    clock: Option<Arc<dyn Clock>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
}

impl CoreConfigBuilder {
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = Some(path.into());
        self
    }

    pub fn site_origin(mut self, origin: impl Into<String>) -> Self {
        self.site_origin = Some(origin.into());
        self
    }

    pub fn title_max_chars(mut self, max: usize) -> Self {
        self.title_max_chars = Some(max);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// `None` disables the load timeout.
    pub fn load_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.load_timeout = Some(timeout);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn session(mut self, session: Arc<dyn SessionProvider>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn notifications(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notifications = Some(sink);
        self
    }

    pub fn document(mut self, document: Arc<dyn DocumentHost>) -> Self {
        self.document = Some(document);
        self
    }

    pub fn timers(mut self, timers: Arc<dyn TimerScheduler>) -> Self {
        self.timers = Some(timers);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Builds and validates the config.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge was not provided
    ///   and no default is available
    /// - [`Error::InvalidSetting`] when a setting is out of range
    pub fn build(self) -> Result<CoreConfig> {
        let session = self
            .session
            .ok_or_else(|| capability_missing("SessionProvider", "route authorisation"))?;

        let site_origin = self.site_origin.unwrap_or_default();

        let http_client = match self.http_client {
            Some(client) => client,
            None => defaults::http_client(&site_origin)?,
        };
        let notifications = match self.notifications {
            Some(sink) => sink,
            None => defaults::notifications()?,
        };
        let document = match self.document {
            Some(document) => document,
            None => defaults::document()?,
        };
        let timers = match self.timers {
            Some(timers) => timers,
            None => defaults::timers()?,
        };

        let config = CoreConfig {
            api_base_url: self
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            login_path: self
                .login_path
                .unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_string()),
            site_origin,
            title_max_chars: self.title_max_chars.unwrap_or(DEFAULT_TITLE_MAX_CHARS),
            poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            load_timeout: self.load_timeout.unwrap_or(Some(DEFAULT_LOAD_TIMEOUT)),
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(crate::events::DEFAULT_EVENT_BUFFER_SIZE),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            http_client,
            session,
            notifications,
            document,
            timers,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            logger_sink: self.logger_sink,
        };

        config.validate()?;

        Ok(config)
    }
}
