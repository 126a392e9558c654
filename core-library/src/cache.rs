//! # Entity Cache
//!
//! Client-side store of server records, normalized by [`Schema`] so each
//! entity is held once no matter how many responses embed it.
//!
//! Writes are atomic: every record in a batch is normalized before anything
//! is merged, so a malformed record leaves the cache untouched. Reads return
//! denormalized JSON.
//!
//! ## Misses
//!
//! [`EntityCache::read_one`] returns [`Lookup::Pending`] with the type's
//! default shape when the record is absent, and asks the registered
//! [`FetchDispatcher`] for it. Only one fetch per `(type, id)` is dispatched
//! until [`EntityCache::complete_fetch`] releases it.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};

use crate::dispatcher::{FetchDispatcher, FetchRequest};
use crate::entity::{record_id, EntityType};
use crate::error::Result;
use crate::graph::EntityGraph;
use crate::merge::{clean, deep_merge};
use crate::normalize::normalize;
use crate::schema::Schema;

/// Result of a single-record read.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// The denormalized record over its type's default shape.
    Found(Value),
    /// Placeholder carrying the id; a fetch has been requested.
    Pending(Value),
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn value(&self) -> &Value {
        match self {
            Lookup::Found(value) | Lookup::Pending(value) => value,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Lookup::Found(value) | Lookup::Pending(value) => value,
        }
    }
}

/// An entry of the "hot media" list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotMedium {
    pub id: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub score_final: Option<f64>,
    #[serde(default)]
    pub creation_date_time: Value,
}

impl HotMedium {
    fn from_record(record: &Value) -> Option<Self> {
        Some(Self {
            id: record_id(record)?,
            score: record.get("score").and_then(Value::as_f64),
            score_final: record.get("scoreFinal").and_then(Value::as_f64),
            creation_date_time: record.get("creationDateTime").cloned().unwrap_or(Value::Null),
        })
    }
}

pub struct EntityCache {
    schema: Arc<Schema>,
    graph: RwLock<EntityGraph>,
    hot_media: RwLock<Vec<HotMedium>>,
    in_flight: Mutex<HashSet<(EntityType, String)>>,
    dispatcher: RwLock<Option<Arc<dyn FetchDispatcher>>>,
    events: Option<EventBus>,
}

impl EntityCache {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            graph: RwLock::new(EntityGraph::new()),
            hot_media: RwLock::new(Vec::new()),
            in_flight: Mutex::new(HashSet::new()),
            dispatcher: RwLock::new(None),
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn set_dispatcher(&self, dispatcher: Arc<dyn FetchDispatcher>) {
        *self.dispatcher.write() = Some(dispatcher);
    }

    /// Normalize `records` and merge them in. Returns the top-level ids.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub fn write(&self, entity_type: EntityType, records: Vec<Value>) -> Result<Vec<String>> {
        let mut flat = Vec::new();
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            ids.push(normalize(&self.schema, entity_type, record, &mut flat)?);
        }

        {
            let mut graph = self.graph.write();
            for record in flat {
                graph.merge(record);
            }
        }

        debug!(%entity_type, count = ids.len(), "Merged records into cache");
        if let Some(events) = &self.events {
            events
                .emit(CoreEvent::Library(LibraryEvent::EntitiesMerged {
                    entity_type: entity_type.key().to_string(),
                    count: ids.len(),
                }))
                .ok();
        }
        Ok(ids)
    }

    /// Store a record edited on the client. Returns it with entities decoded.
    pub fn save(&self, entity_type: EntityType, mut record: Value) -> Result<Value> {
        clean(&mut record);
        self.write(entity_type, vec![record.clone()])?;
        Ok(record)
    }

    /// Every cached record of `entity_type`, in first-insertion order.
    pub fn read_denormalized(&self, entity_type: EntityType) -> Vec<Value> {
        self.graph.read().denormalize_all(&self.schema, entity_type)
    }

    /// The denormalized record, without dispatching anything on a miss.
    pub fn peek(&self, entity_type: EntityType, id: &str) -> Option<Value> {
        self.graph.read().denormalize(&self.schema, entity_type, id)
    }

    pub fn read_one(&self, entity_type: EntityType, id: &str) -> Lookup {
        if let Some(record) = self.peek(entity_type, id) {
            let mut shaped = entity_type.default_shape();
            if let (Value::Object(shape), Value::Object(fields)) = (&mut shaped, record) {
                shape.extend(fields);
            }
            return Lookup::Found(shaped);
        }

        self.request_fetch(entity_type, id);

        let mut placeholder = json!({ "id": id });
        deep_merge(&mut placeholder, entity_type.default_shape());
        Lookup::Pending(placeholder)
    }

    fn request_fetch(&self, entity_type: EntityType, id: &str) {
        let Some(dispatcher) = self.dispatcher.read().clone() else {
            debug!(%entity_type, %id, "Cache miss with no dispatcher registered");
            return;
        };

        let key = (entity_type, id.to_string());
        if !self.in_flight.lock().insert(key.clone()) {
            return;
        }

        if let Err(e) = dispatcher.dispatch(FetchRequest::new(entity_type, id)) {
            warn!(%entity_type, %id, error = %e, "Could not dispatch fetch");
            self.in_flight.lock().remove(&key);
        }
    }

    /// Release the coalescing guard for `(entity_type, id)`.
    pub fn complete_fetch(&self, entity_type: EntityType, id: &str) {
        self.in_flight.lock().remove(&(entity_type, id.to_string()));
    }

    pub fn is_in_flight(&self, entity_type: EntityType, id: &str) -> bool {
        self.in_flight.lock().contains(&(entity_type, id.to_string()))
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    pub fn count(&self, entity_type: EntityType) -> usize {
        self.graph.read().len(entity_type)
    }

    /// The normalized tables, keyed by type then id.
    pub fn snapshot(&self) -> Value {
        self.graph.read().to_json()
    }

    pub fn hot_media(&self) -> Vec<HotMedium> {
        self.hot_media.read().clone()
    }

    /// Append unseen media from a hot-media page. Listed ids keep their place.
    pub fn record_hot(&self, records: &[Value]) {
        let mut hot = self.hot_media.write();
        for entry in records.iter().filter_map(HotMedium::from_record) {
            if !hot.iter().any(|existing| existing.id == entry.id) {
                hot.push(entry);
            }
        }
    }

    /// Site path of an event record: `/Event/<name>-<id>`.
    pub fn event_url(&self, event: &Value) -> Option<String> {
        let id = record_id(event)?;
        let name = event.get("name").and_then(Value::as_str).unwrap_or_default();
        Some(format!(
            "/Event/{}-{}",
            urlencoding::encode(&name.replace(' ', "_")),
            id
        ))
    }

    /// Like [`event_url`](Self::event_url) for a cached (or pending) event id.
    pub fn event_url_for(&self, id: &str) -> Option<String> {
        self.event_url(self.read_one(EntityType::Event, id).value())
    }
}

impl std::fmt::Debug for EntityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let graph = self.graph.read();
        let counts: Map<String, Value> = EntityType::ALL
            .iter()
            .map(|t| (t.key().to_string(), Value::from(graph.len(*t))))
            .collect();
        f.debug_struct("EntityCache")
            .field("counts", &counts)
            .field("in_flight", &self.in_flight.lock().len())
            .finish()
    }
}
