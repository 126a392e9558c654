//! # Entity Fetcher
//!
//! Reads the site API over the host [`HttpClient`], decodes entities in the
//! payload and writes the records into the [`EntityCache`].
//!
//! Every failed request records an error [`Notification`], emits
//! [`LibraryEvent::FetchFailed`] and returns [`LibraryError::Fetch`].

use futures::future::try_join_all;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::notification::{Notification, NotificationSink};
use bridge_traits::time::Clock;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use core_runtime::logging::{redact_if_sensitive, truncate_for_log};
use core_runtime::CoreConfig;

use crate::cache::{EntityCache, HotMedium};
use crate::entity::EntityType;
use crate::error::{LibraryError, Result};
use crate::merge::clean;
use crate::pagination::{PageQuery, RestPage, FULL_COLLECTION_LIMIT};

pub const TIMED_OUT_MESSAGE: &str = "Connection Timed Out";
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown Connection Error";

/// Failure messages are logged up to this many characters; a proxy error
/// page can be arbitrarily large.
const LOGGED_MESSAGE_CHARS: usize = 200;

/// Token the server expects on every POST, read from the page's
/// `_csrf_header` and `_csrf` meta values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    pub header: String,
    pub token: String,
}

impl CsrfToken {
    pub fn new(header: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            token: token.into(),
        }
    }
}

pub struct EntityFetcher {
    http: Arc<dyn HttpClient>,
    notifications: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    cache: Arc<EntityCache>,
    events: EventBus,
    api_base_url: String,
    page_size: u32,
    csrf: RwLock<Option<CsrfToken>>,
}

impl EntityFetcher {
    pub fn new(config: &CoreConfig, cache: Arc<EntityCache>, events: EventBus) -> Self {
        Self {
            http: config.http_client.clone(),
            notifications: config.notifications.clone(),
            clock: config.clock.clone(),
            cache,
            events,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            csrf: RwLock::new(None),
        }
    }

    pub fn cache(&self) -> &Arc<EntityCache> {
        &self.cache
    }

    /// Replace the token sent with POSTs, e.g. after login rotated it.
    pub fn set_csrf(&self, token: Option<CsrfToken>) {
        *self.csrf.write() = token;
    }

    pub fn csrf(&self) -> Option<CsrfToken> {
        self.csrf.read().clone()
    }

    fn api(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path)
    }

    /// Paging for list endpoints read one page at a time.
    pub fn page(&self, page: u32) -> PageQuery {
        PageQuery::new(page, self.page_size)
    }

    // ------------------------------------------------------------------
    // Generic reads
    // ------------------------------------------------------------------

    /// GET a single record (or a list of them) and write it to the cache.
    #[instrument(skip(self))]
    pub async fn get_data(&self, url: &str, entity_type: EntityType) -> Result<Vec<Value>> {
        let mut records = match self.get_json(url, entity_type, None).await? {
            Value::Object(fields) if fields.is_empty() => {
                return Err(LibraryError::EmptyResponse {
                    url: url.to_string(),
                })
            }
            Value::Array(items) if items.is_empty() => {
                return Err(LibraryError::EmptyResponse {
                    url: url.to_string(),
                })
            }
            Value::Array(items) => items,
            other => vec![other],
        };

        records.iter_mut().for_each(clean);
        self.cache.write(entity_type, records.clone())?;
        Ok(records)
    }

    /// GET one page of a list endpoint and write its content to the cache.
    #[instrument(skip(self))]
    pub async fn get_paged_data(
        &self,
        url: &str,
        entity_type: EntityType,
        query: &PageQuery,
    ) -> Result<RestPage> {
        let paged_url = query.apply(url);
        let body = self.get_json(&paged_url, entity_type, None).await?;
        let mut page: RestPage = serde_json::from_value(body)?;

        if page.content.is_empty() {
            debug!(url = %paged_url, "Page has no content");
            return Err(LibraryError::EmptyResponse { url: paged_url });
        }

        page.content.iter_mut().for_each(clean);
        self.cache.write(entity_type, page.content.clone())?;
        Ok(page)
    }

    pub async fn get_paged_content(
        &self,
        url: &str,
        entity_type: EntityType,
        query: &PageQuery,
    ) -> Result<Vec<Value>> {
        Ok(self.get_paged_data(url, entity_type, query).await?.content)
    }

    /// Read a whole collection.
    ///
    /// When the cache already held at least `totalElements` records of the
    /// type, the cached records are returned after the first page. Otherwise
    /// the remaining pages are fetched concurrently and the content of every
    /// page is returned in page order.
    #[instrument(skip(self))]
    pub async fn get_all_paged_content(
        &self,
        url: &str,
        entity_type: EntityType,
        sort: &str,
    ) -> Result<Vec<Value>> {
        let cached_before = self.cache.count(entity_type) as u64;
        let query = PageQuery::new(0, FULL_COLLECTION_LIMIT).sorted(sort);
        let first = self.get_paged_data(url, entity_type, &query).await?;

        if first.total_elements <= cached_before {
            debug!(%entity_type, cached = cached_before, "Collection already cached");
            return Ok(self.cache.read_denormalized(entity_type));
        }

        let rest = try_join_all(first.remaining_pages().map(|page| {
            let query = query.at_page(page);
            async move { self.get_paged_content(url, entity_type, &query).await }
        }))
        .await?;

        let mut content = first.content;
        content.extend(rest.into_iter().flatten());
        Ok(content)
    }

    /// POST `fields` as a form. Returns the response body.
    #[instrument(skip(self, fields))]
    pub async fn post_form<K, V>(&self, url: &str, fields: &[(K, V)]) -> Result<String>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut request = HttpRequest::post(url).form(fields);
        if let Some(csrf) = self.csrf() {
            debug!(
                header = %csrf.header,
                csrf_token = %redact_if_sensitive("csrf_token", &csrf.token),
                "Attaching CSRF token"
            );
            request = request.header(csrf.header, csrf.token);
        }
        let response = self.send(request).await?;
        Ok(response.text()?)
    }

    async fn get_json(&self, url: &str, entity_type: EntityType, id: Option<&str>) -> Result<Value> {
        self.events
            .emit(CoreEvent::Library(LibraryEvent::FetchStarted {
                entity_type: entity_type.key().to_string(),
                id: id.map(str::to_string),
                url: url.to_string(),
            }))
            .ok();

        let response = self.send(HttpRequest::get(url)).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        match self.http.execute(request).await {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => {
                let body = String::from_utf8_lossy(&response.body).into_owned();
                Err(self.report_failure(url, Some(response.status), &body, response.is_timeout()))
            }
            Err(e) => {
                warn!(%url, error = %e, "Request failed without a response");
                Err(self.report_failure(url, None, "", e.is_timeout()))
            }
        }
    }

    fn report_failure(&self, url: String, status: Option<u16>, body: &str, timed_out: bool) -> LibraryError {
        let notification = if timed_out {
            Notification::new(TIMED_OUT_MESSAGE)
        } else if body.trim().is_empty() {
            Notification::new(UNKNOWN_ERROR_MESSAGE)
        } else {
            Notification::from_json(body).unwrap_or_else(|| Notification::new(body))
        }
        .error()
        .recorded_at(self.clock.now());

        let message = notification.message.clone();
        warn!(
            %url,
            ?status,
            message = %log_excerpt(&message),
            timed_out,
            "Fetch failed"
        );
        self.notifications.record(notification);
        self.events
            .emit(CoreEvent::Library(LibraryEvent::FetchFailed {
                url: url.clone(),
                message: message.clone(),
                timed_out,
            }))
            .ok();

        LibraryError::Fetch {
            url,
            status,
            message,
            timed_out,
        }
    }

    async fn get_record(&self, path: &str, entity_type: EntityType, id: &str) -> Result<Value> {
        let url = self.api(path);
        let value = self.get_json(&url, entity_type, Some(id)).await?;
        let mut record = match value {
            Value::Object(fields) if fields.is_empty() => {
                return Err(LibraryError::EmptyResponse { url })
            }
            other => other,
        };
        clean(&mut record);
        self.cache.write(entity_type, vec![record.clone()])?;
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Site endpoints
    // ------------------------------------------------------------------

    /// Fetch one record by id through its type's endpoint.
    pub async fn fetch_entity(&self, entity_type: EntityType, id: &str) -> Result<Value> {
        match entity_type {
            EntityType::Medium => self.medium(id).await,
            EntityType::Song => self.song(id).await,
            EntityType::Artist => self.artist(id).await,
            EntityType::Location => self.location(id).await,
            EntityType::Tag => self.tag(id).await,
            EntityType::Role => self.role(id).await,
            EntityType::Privilege => self.privilege(id).await,
            EntityType::Event => self.event(id).await,
            EntityType::EventTime => self.event_time(id).await,
            EntityType::Occurrence => Err(LibraryError::NoEndpoint(entity_type)),
        }
    }

    pub async fn media(&self, query: &PageQuery) -> Result<Vec<Value>> {
        self.get_paged_content(&self.api("Media"), EntityType::Medium, query)
            .await
    }

    /// Fetch a page of hot media and return the accumulated hot list.
    pub async fn hot_media(&self, query: &PageQuery) -> Result<Vec<HotMedium>> {
        let content = self
            .get_paged_content(&self.api("Media/Hot"), EntityType::Medium, query)
            .await?;
        self.cache.record_hot(&content);
        Ok(self.cache.hot_media())
    }

    pub async fn medium(&self, id: &str) -> Result<Value> {
        self.get_record(&format!("Media/{}", id), EntityType::Medium, id)
            .await
    }

    pub async fn upcoming_events(&self, query: &PageQuery) -> Result<Vec<Value>> {
        self.get_paged_content(&self.api("Events/Upcoming"), EntityType::Occurrence, query)
            .await
    }

    pub async fn event(&self, id: &str) -> Result<Value> {
        self.get_record(&format!("Events/{}", id), EntityType::Event, id)
            .await
    }

    pub async fn event_time(&self, id: &str) -> Result<Value> {
        self.get_record(&format!("EventTimes/{}", id), EntityType::EventTime, id)
            .await
    }

    pub async fn artist(&self, id: &str) -> Result<Value> {
        self.get_record(&format!("Artists/{}", id), EntityType::Artist, id)
            .await
    }

    pub async fn artist_media(&self, id: &str, query: &PageQuery) -> Result<Vec<Value>> {
        let url = self.api(&format!("Artists/{}/Media", id));
        self.get_paged_content(&url, EntityType::Medium, query).await
    }

    pub async fn artist_events(&self, id: &str, query: &PageQuery) -> Result<Vec<Value>> {
        let url = self.api(&format!("Artists/{}/Events", id));
        self.get_paged_content(&url, EntityType::Occurrence, query)
            .await
    }

    pub async fn artists(&self, sort: &str) -> Result<Vec<Value>> {
        self.get_all_paged_content(&self.api("Artists/"), EntityType::Artist, sort)
            .await
    }

    pub async fn locations(&self, sort: &str) -> Result<Vec<Value>> {
        self.get_all_paged_content(&self.api("Locations/"), EntityType::Location, sort)
            .await
    }

    pub async fn location(&self, id: &str) -> Result<Value> {
        self.get_record(&format!("Locations/{}", id), EntityType::Location, id)
            .await
    }

    pub async fn location_events(&self, id: &str, query: &PageQuery) -> Result<Vec<Value>> {
        let url = self.api(&format!("Locations/{}/Events", id));
        self.get_paged_content(&url, EntityType::Occurrence, query)
            .await
    }

    pub async fn songs(&self, sort: &str) -> Result<Vec<Value>> {
        self.get_all_paged_content(&self.api("Songs/"), EntityType::Song, sort)
            .await
    }

    pub async fn song(&self, id: &str) -> Result<Value> {
        self.get_record(&format!("Songs/{}", id), EntityType::Song, id)
            .await
    }

    pub async fn roles(&self, sort: &str) -> Result<Vec<Value>> {
        self.get_all_paged_content(&self.api("Roles/"), EntityType::Role, sort)
            .await
    }

    pub async fn role(&self, id: &str) -> Result<Value> {
        self.get_record(&format!("Roles/{}", id), EntityType::Role, id)
            .await
    }

    pub async fn privileges(&self, sort: &str) -> Result<Vec<Value>> {
        self.get_all_paged_content(&self.api("Privileges/"), EntityType::Privilege, sort)
            .await
    }

    pub async fn privilege(&self, id: &str) -> Result<Value> {
        self.get_record(&format!("Privileges/{}", id), EntityType::Privilege, id)
            .await
    }

    pub async fn tags(&self, sort: &str) -> Result<Vec<Value>> {
        self.get_all_paged_content(&self.api("Tags/"), EntityType::Tag, sort)
            .await
    }

    pub async fn tag(&self, id: &str) -> Result<Value> {
        self.get_record(&format!("Tags/{}", id), EntityType::Tag, id)
            .await
    }
}

impl std::fmt::Debug for EntityFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityFetcher")
            .field("api_base_url", &self.api_base_url)
            .field("page_size", &self.page_size)
            .field("has_csrf", &self.csrf.read().is_some())
            .finish()
    }
}

fn log_excerpt(message: &str) -> String {
    truncate_for_log(message, LOGGED_MESSAGE_CHARS)
}
