//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, session,
//! notifications, document, timers) into the client core and owns one
//! instance of each controller: the router, the entity cache with its fetch
//! layer, the playlists and the music player. Desktop and headless hosts
//! typically enable the `desktop-shims` feature, which fills any bridge they
//! leave out with the `bridge-desktop` implementation.
//!
//! ```ignore
//! use core_service::{CoreDependencies, CoreService};
//!
//! #[tokio::main]
//! async fn main() -> core_service::Result<()> {
//!     let deps = CoreDependencies::headless(session, "/Events", "https://www.soundofjersey.com")?;
//!     let core = CoreService::new(deps.into_builder().build()?)?;
//!     core.init()?;
//!
//!     let mut navigation = core.navigation();
//!     navigation.changed().await.ok();
//!     Ok(())
//! }
//! ```

pub mod error;

pub use error::{CoreError, Result};

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{info, instrument};

use bridge_traits::{
    document::DocumentHost, http::HttpClient, notification::NotificationSink,
    session::SessionProvider, timer::TimerScheduler,
};
use core_library::{
    EntityCache, EntityFetcher, FetchQueue, FetchWorker, QueuedFetchDispatcher, Schema,
};
use core_playback::{MusicPlayerController, PlaybackState, PlayerDeps, PlaylistController};
use core_router::{NavigationOutcome, NavigationState, RouteTable, Router, RouterDeps};
use core_runtime::events::{EventBus, EventStream};
use core_runtime::state::{StateCell, StateReceiver};
use core_runtime::{CoreConfig, CoreConfigBuilder};

pub use core_runtime::logging::{init_logging, LoggingConfig};

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub session: Arc<dyn SessionProvider>,
    pub notifications: Arc<dyn NotificationSink>,
    pub document: Arc<dyn DocumentHost>,
    pub timers: Arc<dyn TimerScheduler>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        session: Arc<dyn SessionProvider>,
        notifications: Arc<dyn NotificationSink>,
        document: Arc<dyn DocumentHost>,
        timers: Arc<dyn TimerScheduler>,
    ) -> Self {
        Self {
            http_client,
            session,
            notifications,
            document,
            timers,
        }
    }

    /// Native bridges for a host without a browser. `start_path` is the
    /// location the first page load routes.
    ///
    /// Must be called inside a tokio runtime; the timer scheduler spawns
    /// tasks on it.
    #[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
    pub fn headless(
        session: Arc<dyn SessionProvider>,
        start_path: &str,
        site_origin: &str,
    ) -> Result<Self> {
        use bridge_desktop::{
            HeadlessDocument, ReqwestHttpClient, TokioTimerScheduler, TracingNotificationSink,
        };

        let http = ReqwestHttpClient::new()
            .map_err(|err| CoreError::InitializationFailed(err.to_string()))?
            .with_base_url(site_origin);

        Ok(Self::new(
            Arc::new(http),
            session,
            Arc::new(TracingNotificationSink::new()),
            Arc::new(HeadlessDocument::new(start_path)),
            Arc::new(TokioTimerScheduler::new()),
        ))
    }

    /// A config builder with every bridge set.
    pub fn into_builder(self) -> CoreConfigBuilder {
        CoreConfig::builder()
            .http_client(self.http_client)
            .session(self.session)
            .notifications(self.notifications)
            .document(self.document)
            .timers(self.timers)
    }
}

struct Inner {
    config: CoreConfig,
    events: EventBus,
    router: Mutex<Router>,
    navigation: Arc<StateCell<NavigationState>>,
    cache: Arc<EntityCache>,
    fetcher: Arc<EntityFetcher>,
    fetch_queue: Mutex<Option<FetchQueue>>,
    fetch_worker: Mutex<Option<FetchWorker>>,
    playlists: Arc<PlaylistController>,
    player: Arc<MusicPlayerController>,
}

/// Primary façade exposed to host applications.
///
/// Cloning is cheap and every clone shares the same controllers.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<Inner>,
}

impl CoreService {
    /// Build the controllers over the site's route table and entity schema.
    pub fn new(config: CoreConfig) -> Result<Self> {
        Self::with_tables(config, RouteTable::site(), Schema::site())
    }

    /// Build the controllers over a custom route table and schema.
    ///
    /// Nothing is fetched or routed until [`init`](Self::init).
    pub fn with_tables(config: CoreConfig, routes: RouteTable, schema: Schema) -> Result<Self> {
        let events = EventBus::new(config.event_buffer_size);

        let router = Router::new(routes, &config, RouterDeps::from_config(&config, events.clone()))?;
        let navigation = router.state_cell();

        let cache = Arc::new(EntityCache::new(Arc::new(schema)).with_events(events.clone()));
        let fetcher = Arc::new(EntityFetcher::new(&config, Arc::clone(&cache), events.clone()));
        let (dispatcher, fetch_queue) = QueuedFetchDispatcher::channel(Arc::clone(&fetcher));
        cache.set_dispatcher(Arc::new(dispatcher));

        let playlists = Arc::new(PlaylistController::new());
        let player = MusicPlayerController::new(
            PlayerDeps::from_config(&config, events.clone()),
            Arc::clone(&playlists),
        );

        info!(
            api_base_url = %config.api_base_url,
            routes = router.routes().len(),
            "Core service constructed"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                events,
                router: Mutex::new(router),
                navigation,
                cache,
                fetcher,
                fetch_queue: Mutex::new(Some(fetch_queue)),
                fetch_worker: Mutex::new(None),
                playlists,
                player,
            }),
        })
    }

    /// Start the background fetch worker and route the current location.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NoRuntime`] outside a tokio runtime
    /// - [`CoreError::AlreadyInitialized`] on a second call
    #[instrument(skip(self))]
    pub fn init(&self) -> Result<NavigationOutcome> {
        Handle::try_current().map_err(|err| CoreError::NoRuntime(err.to_string()))?;

        let queue = self
            .inner
            .fetch_queue
            .lock()
            .take()
            .ok_or(CoreError::AlreadyInitialized)?;
        *self.inner.fetch_worker.lock() = Some(queue.spawn());

        let outcome = self.inner.router.lock().process_first_page_load();
        info!(status = outcome.status(), "Core service initialised");
        Ok(outcome)
    }

    /// Stop the fetch worker and reset the player. Fetches already running
    /// finish; queued ones are dropped and may be dispatched again by a
    /// later read.
    pub fn shutdown(&self) {
        if let Some(worker) = self.inner.fetch_worker.lock().take() {
            worker.stop();
        }
        self.inner.player.reset();
    }

    /// Install the global tracing subscriber from the config, mirroring into
    /// its logger sink when one is set.
    ///
    /// # Errors
    ///
    /// [`CoreError::Config`] when a subscriber is already installed.
    pub fn install_logging(&self) -> Result<()> {
        init_logging(self.inner.config.logging())?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.fetch_queue.lock().is_none()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.inner.events.subscribe())
    }

    /// Exclusive access to the router; navigations are serialized through it.
    pub fn router(&self) -> MutexGuard<'_, Router> {
        self.inner.router.lock()
    }

    pub fn navigate(&self, path: &str) -> NavigationOutcome {
        self.inner.router.lock().navigate(path)
    }

    pub fn cache(&self) -> &Arc<EntityCache> {
        &self.inner.cache
    }

    pub fn fetcher(&self) -> &Arc<EntityFetcher> {
        &self.inner.fetcher
    }

    pub fn playlists(&self) -> &Arc<PlaylistController> {
        &self.inner.playlists
    }

    pub fn player(&self) -> &Arc<MusicPlayerController> {
        &self.inner.player
    }

    /// Navigation state updates. Reading does not take the router lock.
    pub fn navigation(&self) -> StateReceiver<NavigationState> {
        self.inner.navigation.subscribe()
    }

    pub fn playback(&self) -> StateReceiver<PlaybackState> {
        self.inner.player.subscribe()
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("api_base_url", &self.inner.config.api_base_url)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
