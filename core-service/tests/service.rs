//! Service wiring: controllers share one event bus, init starts the fetch
//! worker and routes the document's location.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::document::DocumentHost;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::notification::{Notification, NotificationSink};
use bridge_traits::session::SessionProvider;
use bridge_traits::time::{LogEntry, LoggerSink};
use bridge_traits::timer::ManualTimerScheduler;
use core_library::EntityType;
use core_playback::adapters::SoundCloudAdapter;
use core_playback::{MediaKind, PlaybackPhase, PlaybackRequest};
use core_router::{Modal, NavigationOutcome, Page};
use core_runtime::events::{CoreEvent, NavigationEvent};
use core_service::{CoreDependencies, CoreError, CoreService};
use mockall::mock;
use parking_lot::Mutex;

mock! {
    pub Http {}

    #[async_trait::async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

mock! {
    pub Widget {}

    impl bridge_traits::media::SoundCloudWidget for Widget {
        fn play(&self) -> BridgeResult<()>;
        fn pause(&self) -> BridgeResult<()>;
        fn seek_to(&self, milliseconds: u64) -> BridgeResult<()>;
        fn set_volume(&self, volume: f64) -> BridgeResult<()>;
        fn position_ms(&self) -> f64;
        fn duration_ms(&self) -> f64;
        fn loaded_progress(&self) -> f64;
        fn unbind_all(&self);
    }
}

struct Anonymous;

impl SessionProvider for Anonymous {
    fn is_logged_in(&self) -> bool {
        false
    }

    fn authorities(&self) -> Option<Vec<String>> {
        None
    }
}

struct Location(&'static str);

impl DocumentHost for Location {
    fn pathname(&self) -> String {
        self.0.to_string()
    }

    fn search(&self) -> String {
        String::new()
    }

    fn push_state(&self, _url: &str) {}

    fn set_title(&self, _title: &str) {}

    fn set_meta_tag(&self, _name: &str, _content: &str) {}
}

struct Quiet;

impl NotificationSink for Quiet {
    fn record(&self, _notification: Notification) {}
}

#[derive(Default)]
struct RecordingLog {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait::async_trait]
impl LoggerSink for RecordingLog {
    async fn log(&self, entry: LogEntry) -> BridgeResult<()> {
        self.entries.lock().push(entry);
        Ok(())
    }
}

fn dependencies(path: &'static str, http: MockHttp) -> CoreDependencies {
    CoreDependencies::new(
        Arc::new(http),
        Arc::new(Anonymous),
        Arc::new(Quiet),
        Arc::new(Location(path)),
        Arc::new(ManualTimerScheduler::new()),
    )
}

fn service(path: &'static str, http: MockHttp) -> CoreService {
    let config = dependencies(path, http).into_builder().build().unwrap();
    CoreService::new(config).unwrap()
}

#[tokio::test]
async fn test_init_routes_the_current_location() {
    let core = service("/About", MockHttp::new());
    let mut events = core.events().subscribe();

    let outcome = core.init().unwrap();

    assert!(outcome.is_committed());
    let state = core.navigation().borrow().clone();
    assert_eq!(state.current_page, Page::About);
    assert!(state.title.ends_with("About"));
    assert!(matches!(
        events.recv().await.unwrap(),
        CoreEvent::Navigation(NavigationEvent::Committed { .. })
    ));
}

#[tokio::test]
async fn test_init_runs_once() {
    let core = service("/", MockHttp::new());
    core.init().unwrap();

    assert!(core.is_initialized());
    assert!(matches!(core.init(), Err(CoreError::AlreadyInitialized)));
}

#[test]
fn test_init_needs_a_runtime() {
    let core = service("/", MockHttp::new());

    assert!(matches!(core.init(), Err(CoreError::NoRuntime(_))));
    assert!(!core.is_initialized());
}

#[tokio::test]
async fn test_gated_route_sends_anonymous_users_to_login() {
    let core = service("/", MockHttp::new());
    core.init().unwrap();

    let outcome = core.navigate("/Admin");

    assert_eq!(
        outcome,
        NavigationOutcome::Forbidden {
            redirect: Some("/login".to_string())
        }
    );
    assert_eq!(core.navigation().borrow().current_modal, Modal::Login);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cache_miss_is_fetched_by_the_worker() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .withf(|request| request.url == "/api/v1/Media/m1")
        .times(1)
        .returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"id":"m1","song":{"id":"s1","name":"Intro","artist":{"id":"a1","name":"Band"}}}"#
                    .to_string(),
            ))
        });
    let core = service("/", http);
    core.init().unwrap();

    let first = core.cache().read_one(EntityType::Medium, "m1");
    assert!(!first.is_found());
    assert_eq!(first.value()["id"], "m1");

    let found = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(medium) = core.cache().peek(EntityType::Medium, "m1") {
                return medium;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(found["song"]["name"], "Intro");
}

#[tokio::test]
async fn test_playback_state_is_observable_through_the_service() {
    let core = service("/", MockHttp::new());
    let mut playback = core.playback();

    let mut widget = MockWidget::new();
    widget.expect_set_volume().returning(|_| Ok(()));
    widget.expect_duration_ms().return_const(180_000.0);
    widget.expect_unbind_all().times(1).return_const(());

    let session = core
        .player()
        .register(
            PlaybackRequest::new(Arc::new(SoundCloudAdapter::new(Arc::new(widget))))
                .song("Intro")
                .in_playlist("home"),
        )
        .unwrap();
    core.player().on_ready(session).unwrap();

    assert!(playback.has_changed().unwrap());
    let state = playback.borrow_and_update().clone();
    assert_eq!(state.media_type, MediaKind::SoundCloud);
    assert_eq!(state.phase, PlaybackPhase::Playing);
    assert_eq!(state.duration, 180.0);

    core.shutdown();
    assert_eq!(core.player().state().phase, PlaybackPhase::Idle);
}

#[test]
fn test_logging_mirrors_into_the_configured_sink() {
    let sink = Arc::new(RecordingLog::default());
    let config = dependencies("/", MockHttp::new())
        .into_builder()
        .logger_sink(sink.clone())
        .build()
        .unwrap();
    let core = CoreService::new(config).unwrap();

    core.install_logging().unwrap();
    tracing::warn!(target: "core_service", path = "/Admin", "Navigation forbidden");

    let entries = sink.entries.lock();
    let entry = entries
        .iter()
        .find(|entry| entry.message == "Navigation forbidden")
        .unwrap();
    assert_eq!(entry.fields.get("path").map(String::as_str), Some("/Admin"));
    drop(entries);

    assert!(matches!(core.install_logging(), Err(CoreError::Config(_))));
}

#[tokio::test]
async fn test_shutdown_releases_queued_fetches() {
    let mut http = MockHttp::new();
    http.expect_execute().times(0);
    let core = service("/", http);
    core.init().unwrap();

    core.cache().read_one(EntityType::Artist, "a1");
    assert_eq!(core.cache().in_flight_count(), 1);

    core.shutdown();

    tokio::time::timeout(Duration::from_secs(2), async {
        while core.cache().in_flight_count() > 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    assert!(!core.cache().read_one(EntityType::Artist, "a1").is_found());
    assert_eq!(core.cache().in_flight_count(), 0);
}
