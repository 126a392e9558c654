//! # Event Bus System
//!
//! Decoupled notifications between the router, the entity layer and the
//! music player, carried over `tokio::sync::broadcast`.
//!
//! ```text
//! ┌─────────────┐     emit      ┌───────────┐
//! │   Router    ├──────────────>│           │
//! └─────────────┘               │           │     subscribe    ┌────────────┐
//! ┌─────────────┐     emit      │ EventBus  ├─────────────────>│ Subscriber │
//! │ EntityCache ├──────────────>│           │                  └────────────┘
//! └─────────────┘               │           │     subscribe    ┌────────────┐
//! ┌─────────────┐     emit      │           ├─────────────────>│ Subscriber │
//! │ MusicPlayer ├──────────────>│           │                  └────────────┘
//! └─────────────┘               └───────────┘
//! ```
//!
//! Events are informational. Reactive UI state lives in
//! [`StateCell`](crate::state::StateCell)s; the bus is for hosts and
//! diagnostics that want a log of what happened.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, NavigationEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut stream = bus.subscribe();
//!
//! bus.emit(CoreEvent::Navigation(NavigationEvent::NotFound {
//!     path: "/nowhere".to_string(),
//! }))
//! .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.description(), "No route matched");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; keep receiving.
//! - **`RecvError::Closed`**: every sender was dropped; treat as shutdown.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum, one variant per domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Navigation(NavigationEvent),
    Library(LibraryEvent),
    Playback(PlaybackEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Navigation(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Library(LibraryEvent::FetchFailed { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Navigation(NavigationEvent::NotFound { .. }) => EventSeverity::Warning,
            CoreEvent::Navigation(NavigationEvent::Forbidden { .. }) => EventSeverity::Warning,
            CoreEvent::Navigation(NavigationEvent::Committed { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::BackendRegistered { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Navigation Events
// ============================================================================

/// Outcomes of router operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum NavigationEvent {
    /// A route matched, passed its authorisation gate and was written to
    /// navigation state.
    Committed {
        path: String,
        /// Numeric page value after the commit.
        page: u16,
        /// Numeric modal value after the commit.
        modal: u16,
        /// Navigation state sequence number produced by this commit.
        sequence: u64,
    },
    /// No route applied to the path.
    NotFound { path: String },
    /// A route matched but the session lacks the required authority.
    Forbidden {
        path: String,
        required: String,
        /// Path navigated to instead, if any.
        redirect: Option<String>,
    },
    /// The query map was re-read and committed.
    QueryUpdated { query: BTreeMap<String, String> },
}

impl NavigationEvent {
    fn description(&self) -> &str {
        match self {
            NavigationEvent::Committed { .. } => "Navigation committed",
            NavigationEvent::NotFound { .. } => "No route matched",
            NavigationEvent::Forbidden { .. } => "Navigation forbidden",
            NavigationEvent::QueryUpdated { .. } => "Query updated",
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Events from the entity cache and its fetch layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// Records were normalized and merged into the cache.
    EntitiesMerged {
        /// Wire key of the top-level entity type written.
        entity_type: String,
        /// Number of top-level records in the write.
        count: usize,
    },
    /// A fetch was dispatched for a missing or listed entity.
    FetchStarted {
        entity_type: String,
        id: Option<String>,
        url: String,
    },
    /// A fetch failed; the notification text is in `message`.
    FetchFailed {
        url: String,
        message: String,
        timed_out: bool,
    },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::EntitiesMerged { .. } => "Entities merged into cache",
            LibraryEvent::FetchStarted { .. } => "Entity fetch started",
            LibraryEvent::FetchFailed { .. } => "Entity fetch failed",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events from the music player controller.
///
/// `session` identifies one backend registration; events for an older session
/// never follow a `BackendRegistered` for a newer one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    BackendRegistered {
        session: u64,
        /// Backend kind name, e.g. "YouTube".
        kind: String,
        song_name: String,
    },
    /// The backend reported its duration.
    Loaded { session: u64, duration_secs: f64 },
    Started { session: u64 },
    Paused { session: u64, position_secs: f64 },
    Ended { session: u64 },
    /// The backend never became ready within the load timeout.
    Failed { session: u64, message: String },
    /// The active backend was torn down.
    Reset { session: u64 },
    VolumeChanged { volume: f64 },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::BackendRegistered { .. } => "Media backend registered",
            PlaybackEvent::Loaded { .. } => "Media loaded",
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Ended { .. } => "Playback ended",
            PlaybackEvent::Failed { .. } => "Playback failed",
            PlaybackEvent::Reset { .. } => "Media backend reset",
            PlaybackEvent::VolumeChanged { .. } => "Volume changed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning shares the underlying channel. Slow subscribers receive
/// `RecvError::Lagged` instead of blocking publishers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers reached, or an error if there are
    /// none. Publishers inside the core ignore that error.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(100);
/// let playback_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Playback(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Only events at or above `min` severity will be returned.
    pub fn min_severity(self, min: EventSeverity) -> Self {
        self.filter(move |event| event.severity() >= min)
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` once every sender is dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking receive. `None` when nothing matching is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn committed(path: &str, sequence: u64) -> CoreEvent {
        CoreEvent::Navigation(NavigationEvent::Committed {
            path: path.to_string(),
            page: 1,
            modal: 0,
            sequence,
        })
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(committed("/Events", 1)).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Playback(PlaybackEvent::BackendRegistered {
            session: 1,
            kind: "YouTube".to_string(),
            song_name: "Intro".to_string(),
        });
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream =
            EventStream::new(bus.subscribe()).filter(|event| matches!(event, CoreEvent::Library(_)));

        bus.emit(committed("/Events", 1)).ok();
        let library_event = CoreEvent::Library(LibraryEvent::EntitiesMerged {
            entity_type: "event".to_string(),
            count: 3,
        });
        bus.emit(library_event.clone()).ok();

        assert_eq!(stream.recv().await.unwrap(), library_event);
    }

    #[tokio::test]
    async fn test_event_stream_min_severity() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe()).min_severity(EventSeverity::Warning);

        bus.emit(committed("/Events", 1)).ok();
        bus.emit(CoreEvent::Playback(PlaybackEvent::Started { session: 1 }))
            .ok();
        let not_found = CoreEvent::Navigation(NavigationEvent::NotFound {
            path: "/nope".to_string(),
        });
        bus.emit(not_found.clone()).ok();

        assert_eq!(stream.try_recv().unwrap().unwrap(), not_found);
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(committed("/Events", i)).ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        let failed = CoreEvent::Playback(PlaybackEvent::Failed {
            session: 2,
            message: "Unable to load media".to_string(),
        });
        assert_eq!(failed.severity(), EventSeverity::Error);

        let forbidden = CoreEvent::Navigation(NavigationEvent::Forbidden {
            path: "/ADMIN".to_string(),
            required: "PRIV_ADMIN".to_string(),
            redirect: Some("/login".to_string()),
        });
        assert_eq!(forbidden.severity(), EventSeverity::Warning);
        assert_eq!(committed("/", 1).severity(), EventSeverity::Info);

        let tick = CoreEvent::Playback(PlaybackEvent::VolumeChanged { volume: 0.5 });
        assert_eq!(tick.severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_event_description() {
        let event = CoreEvent::Library(LibraryEvent::FetchFailed {
            url: "/api/v1/media".to_string(),
            message: "Connection Timed Out".to_string(),
            timed_out: true,
        });
        assert_eq!(event.description(), "Entity fetch failed");
    }

    #[tokio::test]
    async fn test_concurrent_publishers() {
        let bus = EventBus::new(100);
        let mut sub = bus.subscribe();

        let bus1 = bus.clone();
        let bus2 = bus.clone();

        let handle1 = tokio::spawn(async move {
            for i in 0..10 {
                bus1.emit(committed("/Events", i)).ok();
            }
        });
        let handle2 = tokio::spawn(async move {
            for i in 0..10 {
                bus2.emit(CoreEvent::Playback(PlaybackEvent::Started { session: i }))
                    .ok();
            }
        });

        handle1.await.ok();
        handle2.await.ok();

        let mut count = 0;
        while sub.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 20);
    }

    #[test]
    fn test_event_serialization() {
        let mut query = BTreeMap::new();
        query.insert("page".to_string(), "2".to_string());
        let event = CoreEvent::Navigation(NavigationEvent::QueryUpdated { query });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Navigation");
        assert_eq!(json["payload"]["event"], "QueryUpdated");
        assert_eq!(json["payload"]["query"]["page"], "2");

        let back: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
