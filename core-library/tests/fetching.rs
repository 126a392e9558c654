//! Integration tests for the fetch layer
//!
//! The HTTP client is a mockall double; notifications and the document are
//! small in-memory fakes. Covered:
//! - Endpoint URLs and paging parameters
//! - Writes into the cache, entity decoding and emitted events
//! - Failure notifications
//! - Background fetches for cache misses

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::document::DocumentHost;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::notification::{Notification, NotificationSink};
use bridge_traits::session::SessionProvider;
use bridge_traits::time::{Clock, FixedClock, SystemClock};
use bridge_traits::timer::ManualTimerScheduler;
use core_library::{
    CsrfToken, EntityCache, EntityFetcher, EntityType, LibraryError, Lookup, PageQuery,
    QueuedFetchDispatcher, Schema,
};
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use core_runtime::CoreConfig;
use mockall::mock;
use parking_lot::Mutex;
use serde_json::json;

mock! {
    pub Http {}

    #[async_trait::async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
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

struct BlankDocument;

impl DocumentHost for BlankDocument {
    fn pathname(&self) -> String {
        "/".to_string()
    }

    fn search(&self) -> String {
        String::new()
    }

    fn push_state(&self, _url: &str) {}

    fn set_title(&self, _title: &str) {}

    fn set_meta_tag(&self, _name: &str, _content: &str) {}
}

#[derive(Default)]
struct RecordingNotifications {
    recorded: Mutex<Vec<Notification>>,
}

impl RecordingNotifications {
    fn taken(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.recorded.lock())
    }
}

impl NotificationSink for RecordingNotifications {
    fn record(&self, notification: Notification) {
        self.recorded.lock().push(notification);
    }
}

struct Harness {
    fetcher: Arc<EntityFetcher>,
    cache: Arc<EntityCache>,
    notifications: Arc<RecordingNotifications>,
    clock: Arc<FixedClock>,
    events: EventBus,
}

fn harness(http: MockHttp) -> Harness {
    let notifications = Arc::new(RecordingNotifications::default());
    let clock = Arc::new(FixedClock(SystemClock.now()));
    let config = CoreConfig::builder()
        .http_client(Arc::new(http))
        .session(Arc::new(Anonymous))
        .notifications(notifications.clone())
        .document(Arc::new(BlankDocument))
        .timers(Arc::new(ManualTimerScheduler::new()))
        .clock(clock.clone())
        .build()
        .unwrap();

    let events = EventBus::new(64);
    let cache = Arc::new(EntityCache::new(Arc::new(Schema::site())).with_events(events.clone()));
    let fetcher = Arc::new(EntityFetcher::new(&config, cache.clone(), events.clone()));

    Harness {
        fetcher,
        cache,
        notifications,
        clock,
        events,
    }
}

fn respond(status: u16, body: &str) -> BridgeResult<HttpResponse> {
    Ok(HttpResponse::new(status, body.to_string()))
}

fn page_body(ids: &[&str], number: u32, total_pages: u32, total_elements: u64) -> String {
    let content: Vec<_> = ids.iter().map(|id| json!({"id": id, "name": id})).collect();
    json!({
        "content": content,
        "number": number,
        "totalPages": total_pages,
        "totalElements": total_elements,
        "size": ids.len()
    })
    .to_string()
}

#[tokio::test]
async fn test_medium_is_fetched_decoded_and_cached() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .withf(|r| r.method == HttpMethod::Get && r.url == "/api/v1/Media/m1")
        .times(1)
        .returning(|_| {
            respond(
                200,
                r#"{"id":"m1","song":{"id":"s1","name":"Drum &amp; Bass","artist":{"id":"a1","name":"DJ"}}}"#,
            )
        });
    let h = harness(http);
    let mut rx = h.events.subscribe();

    let medium = h.fetcher.medium("m1").await.unwrap();

    assert_eq!(medium["song"]["name"], "Drum & Bass");
    assert_eq!(h.cache.count(EntityType::Artist), 1);
    let lookup = h.cache.read_one(EntityType::Medium, "m1");
    assert!(lookup.is_found());
    assert_eq!(lookup.value()["song"]["artist"]["name"], "DJ");

    match rx.recv().await.unwrap() {
        CoreEvent::Library(LibraryEvent::FetchStarted { entity_type, id, url }) => {
            assert_eq!(entity_type, "media");
            assert_eq!(id.as_deref(), Some("m1"));
            assert_eq!(url, "/api/v1/Media/m1");
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert!(matches!(
        rx.recv().await.unwrap(),
        CoreEvent::Library(LibraryEvent::EntitiesMerged { count: 1, .. })
    ));
}

#[tokio::test]
async fn test_get_data_rejects_empty_objects() {
    let mut http = MockHttp::new();
    http.expect_execute().returning(|_| respond(200, "{}"));
    let h = harness(http);

    let result = h.fetcher.get_data("/api/v1/Tags/t", EntityType::Tag).await;

    assert!(matches!(result, Err(LibraryError::EmptyResponse { .. })));
    assert_eq!(h.cache.count(EntityType::Tag), 0);
    assert!(h.notifications.taken().is_empty());
}

#[tokio::test]
async fn test_paged_request_carries_paging_parameters() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .withf(|r| r.url == "/api/v1/Events/Upcoming?page=1&limit=15&sort=")
        .times(1)
        .returning(|_| {
            respond(
                200,
                &json!({
                    "content": [{"id": "o1", "event": {"id": "e1", "location": {"id": "l1"}}}],
                    "number": 1,
                    "totalPages": 2,
                    "totalElements": 16
                })
                .to_string(),
            )
        });
    let h = harness(http);

    let content = h.fetcher.upcoming_events(&h.fetcher.page(1)).await.unwrap();

    assert_eq!(content.len(), 1);
    assert_eq!(h.cache.count(EntityType::Occurrence), 1);
    assert_eq!(h.cache.count(EntityType::Location), 1);
    let occurrence = h.cache.peek(EntityType::Occurrence, "o1").unwrap();
    assert_eq!(occurrence["event"]["location"]["id"], "l1");
}

#[tokio::test]
async fn test_empty_page_is_an_error() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .returning(|_| respond(200, &page_body(&[], 0, 0, 0)));
    let h = harness(http);

    let result = h.fetcher.media(&PageQuery::default()).await;

    assert!(matches!(result, Err(LibraryError::EmptyResponse { url }) if url.ends_with("page=0&limit=15&sort=")));
}

#[tokio::test]
async fn test_whole_collection_fetches_remaining_pages() {
    let mut http = MockHttp::new();
    http.expect_execute().times(3).returning(|r| {
        let body = if r.url.contains("page=0&") {
            page_body(&["a", "b"], 0, 3, 5)
        } else if r.url.contains("page=1&") {
            page_body(&["c", "d"], 1, 3, 5)
        } else {
            page_body(&["e"], 2, 3, 5)
        };
        assert!(r.url.starts_with("/api/v1/Artists/?"));
        assert!(r.url.contains("limit=100"));
        respond(200, &body)
    });
    let h = harness(http);

    let artists = h.fetcher.artists("").await.unwrap();

    let ids: Vec<&str> = artists.iter().map(|a| a["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["a", "b", "c", "d", "e"]);
    assert_eq!(h.cache.count(EntityType::Artist), 5);
}

#[tokio::test]
async fn test_whole_collection_served_from_cache_when_complete() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(|_| respond(200, &page_body(&["b"], 0, 2, 2)));
    let h = harness(http);
    h.cache
        .write(EntityType::Tag, vec![json!({"id": "a"}), json!({"id": "b"})])
        .unwrap();

    let tags = h.fetcher.tags("").await.unwrap();

    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0]["id"], "a");
}

#[tokio::test]
async fn test_failures_become_error_notifications() {
    let mut http = MockHttp::new();
    http.expect_execute().returning(|r| match r.url.as_str() {
        "/api/v1/Tags/slow" => respond(408, ""),
        "/api/v1/Tags/gone" => Err(BridgeError::Timeout("no response".to_string())),
        "/api/v1/Tags/blank" => respond(500, ""),
        "/api/v1/Tags/bad" => respond(
            400,
            r#"{"status":400,"error":"Bad Request","message":"Tag name must not be empty"}"#,
        ),
        _ => respond(502, "Bad Gateway"),
    });
    let h = harness(http);
    let mut rx = h.events.subscribe();

    let slow = h.fetcher.tag("slow").await.unwrap_err();
    assert!(matches!(slow, LibraryError::Fetch { timed_out: true, status: Some(408), .. }));
    assert!(slow.is_transient());

    let gone = h.fetcher.tag("gone").await.unwrap_err();
    assert!(matches!(gone, LibraryError::Fetch { timed_out: true, status: None, .. }));

    h.fetcher.tag("blank").await.unwrap_err();
    let bad = h.fetcher.tag("bad").await.unwrap_err();
    assert!(!bad.is_transient());
    h.fetcher.tag("proxy").await.unwrap_err();

    let recorded = h.notifications.taken();
    let messages: Vec<&str> = recorded.iter().map(|n| n.message.as_str()).collect();
    assert_eq!(
        messages,
        [
            "Connection Timed Out",
            "Connection Timed Out",
            "Unknown Connection Error",
            "Tag name must not be empty",
            "Bad Gateway"
        ]
    );
    assert!(recorded.iter().all(|n| n.is_error));
    assert!(recorded.iter().all(|n| n.recorded_at == h.clock.now()));
    assert_eq!(recorded[3].status, Some(400));

    let mut failures = 0;
    while let Ok(event) = rx.try_recv() {
        if let CoreEvent::Library(LibraryEvent::FetchFailed { .. }) = event {
            failures += 1;
        }
    }
    assert_eq!(failures, 5);
}

#[tokio::test]
async fn test_post_form_sends_csrf_header() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .withf(|r| {
            r.method == HttpMethod::Post
                && r.headers.get("X-CSRF-TOKEN").map(String::as_str) == Some("tok")
                && r.body.as_deref() == Some(b"name=Jazz%20Club".as_slice())
        })
        .times(1)
        .returning(|_| respond(200, "saved"));
    let h = harness(http);
    h.fetcher.set_csrf(Some(CsrfToken::new("X-CSRF-TOKEN", "tok")));

    let body = h
        .fetcher
        .post_form("/api/v1/Tags", &[("name", "Jazz Club")])
        .await
        .unwrap();

    assert_eq!(body, "saved");
}

#[tokio::test]
async fn test_hot_media_accumulate() {
    let mut http = MockHttp::new();
    http.expect_execute().returning(|r| {
        let body = if r.url.contains("page=0&") {
            json!({"content": [{"id": "m2", "score": 4.0}, {"id": "m1", "score": 2.0}], "number": 0, "totalPages": 2, "totalElements": 3})
        } else {
            json!({"content": [{"id": "m1", "score": 1.0}, {"id": "m3"}], "number": 1, "totalPages": 2, "totalElements": 3})
        };
        respond(200, &body.to_string())
    });
    let h = harness(http);

    h.fetcher.hot_media(&h.fetcher.page(0)).await.unwrap();
    let hot = h.fetcher.hot_media(&h.fetcher.page(1)).await.unwrap();

    let ids: Vec<&str> = hot.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["m2", "m1", "m3"]);
    assert_eq!(hot[1].score, Some(2.0));
}

#[tokio::test]
async fn test_occurrences_have_no_single_endpoint() {
    let h = harness(MockHttp::new());

    let result = h.fetcher.fetch_entity(EntityType::Occurrence, "o1").await;

    assert!(matches!(result, Err(LibraryError::NoEndpoint(EntityType::Occurrence))));
}

#[tokio::test]
async fn test_cache_miss_is_fetched_in_background() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .withf(|r| r.url == "/api/v1/Artists/a7")
        .times(1)
        .returning(|_| respond(200, r#"{"id":"a7","name":"Late Arrival"}"#));
    let h = harness(http);
    let (dispatcher, queue) = QueuedFetchDispatcher::channel(h.fetcher.clone());
    h.cache.set_dispatcher(Arc::new(dispatcher));
    let worker = queue.spawn();

    assert_eq!(
        h.cache.read_one(EntityType::Artist, "a7"),
        Lookup::Pending(json!({"id": "a7"}))
    );
    // Coalesced with the fetch already queued.
    assert!(!h.cache.read_one(EntityType::Artist, "a7").is_found());

    let found = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if h.cache.in_flight_count() == 0 {
                if let Lookup::Found(artist) = h.cache.read_one(EntityType::Artist, "a7") {
                    return artist;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(found["name"], "Late Arrival");
    worker.stop().await.unwrap();
}

#[tokio::test]
async fn test_stopped_worker_releases_queued_requests() {
    let mut http = MockHttp::new();
    http.expect_execute().times(0);
    let h = harness(http);
    let (dispatcher, queue) = QueuedFetchDispatcher::channel(h.fetcher.clone());
    h.cache.set_dispatcher(Arc::new(dispatcher));

    // The worker has not been polled yet, so both requests are still queued
    // when it sees the stop signal.
    let worker = queue.spawn();
    h.cache.read_one(EntityType::Artist, "a1");
    h.cache.read_one(EntityType::Tag, "t1");
    assert_eq!(h.cache.in_flight_count(), 2);

    worker.stop().await.unwrap();

    assert_eq!(h.cache.in_flight_count(), 0);
    // The queue is closed: a new miss fails to dispatch and leaves no guard.
    h.cache.read_one(EntityType::Artist, "a1");
    assert!(!h.cache.is_in_flight(EntityType::Artist, "a1"));
}
